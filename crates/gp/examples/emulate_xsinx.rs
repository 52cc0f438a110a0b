use gpemu_gp::kernels::StationaryKind;
use gpemu_gp::{GaussianProcess, Kernel};
use linfa::prelude::*;
use ndarray::{arr2, Array, Array2, Axis};

fn xsinx(x: &Array2<f64>) -> Array2<f64> {
    (x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())
}

fn main() {
    let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
    let yt = xsinx(&xt);

    let kernel = Kernel::stationary(StationaryKind::SquaredExponential, 1.0, ndarray::arr1(&[1.0]))
        + Kernel::bias();
    let gp = GaussianProcess::params(kernel)
        .fit(&Dataset::new(xt, yt))
        .expect("GP fitted");
    println!("{gp}");

    let xtest = Array::linspace(0., 25., 26).insert_axis(Axis(1));
    let ytest = xsinx(&xtest);
    let (ypred, yvar) = gp.predict_valvar(&xtest).expect("GP prediction");
    println!("x, true, mean, std");
    for i in 0..xtest.nrows() {
        println!(
            "{:.1}, {:.3}, {:.3}, {:.3}",
            xtest[[i, 0]],
            ytest[[i, 0]],
            ypred[[i, 0]],
            yvar[[i, 0]].sqrt()
        );
    }
}
