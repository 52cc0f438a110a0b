use gpemu::{
    implausibility::implausibility, uniform_params, AbcSampler, Emulator, KernelSpec,
    LabeledGrid, Sampler, SamplerConfig, Uncertainties, Uncertainty,
};
use ndarray::{array, Array1, Axis};

fn simulator(a: f64, b: f64) -> f64 {
    a * a + 2. * b
}

fn main() {
    let params = uniform_params(2, 5);
    let outputs: Array1<f64> = params
        .axis_iter(Axis(0))
        .map(|x| simulator(x[0], x[1]))
        .collect();
    let ensemble = LabeledGrid::new(outputs.into_dyn())
        .with_name("response")
        .with_units("m");

    let mut emulator =
        Emulator::new(&params, &ensemble, KernelSpec::default()).expect("valid emulator");
    emulator.train().expect("emulator training");

    let (mean, var) = emulator
        .predict(&array![[0.3, 0.7]])
        .expect("emulator prediction");
    println!(
        "{} at [0.3, 0.7]: {} {} (variance {}), expected {}",
        mean.name(),
        mean.data(),
        mean.units(),
        var.data(),
        simulator(0.3, 0.7)
    );

    let obs = LabeledGrid::new(array![2.].into_dyn());
    let uncertainties = Uncertainties::default().observational(Uncertainty::absolute(0.1));

    let sampler = Sampler::new(
        &emulator,
        &obs,
        uncertainties.clone(),
        SamplerConfig::default().seed(42),
    )
    .expect("valid sampler");
    let trace = sampler.sample_with_trace(500).expect("MCMC sampling");
    let imp = implausibility(&emulator, &obs, &trace.states, &uncertainties, true)
        .expect("implausibility");
    println!(
        "MCMC: {} samples, acceptance rate {:.2}, mean implausibility {:.3}",
        trace.states.nrows(),
        trace.acceptance_rate(),
        imp.mean().unwrap_or(f64::NAN)
    );

    let abc = AbcSampler::new(&emulator, &obs, uncertainties)
        .expect("valid sampler")
        .sample(2000, 3., 0.)
        .expect("ABC sampling");
    println!(
        "ABC: {} plausible samples out of {} ({:.1}%)",
        abc.n_accepted(),
        abc.n_drawn,
        100. * abc.acceptance_rate()
    );
}
