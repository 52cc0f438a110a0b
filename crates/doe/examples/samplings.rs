use gpemu_doe::{RandomUniform, SamplingMethod, UniformGrid};
use ndarray::arr2;

fn main() {
    let xlimits = arr2(&[[0., 1.], [-10., 10.], [5., 15.]]);
    let n = 10;

    println!("Take {n} samples in");
    println!("{xlimits}\n");

    println!("*** using uniform random sampling");
    let samples = RandomUniform::new(&xlimits).sample(n);
    println!("{samples}\n");

    println!("*** using a uniform grid with 3 levels per parameter");
    let samples = UniformGrid::new(&xlimits, 3).sample(n);
    println!("{samples}\n");
}
