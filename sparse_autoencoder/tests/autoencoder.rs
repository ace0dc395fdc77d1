use ndarray::{Array, ArrayD, Axis, IxDyn};
use ndarray_rand::RandomExt;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::Uniform;

use sparse_autoencoder::{
    SaeErr,
    autoencoder::{
        Autoencoder, OuterBiasMode, SparseAutoencoder, SparseAutoencoderConfig,
        components::{Decoder, DecoderBias, Encoder, LinearDecoder, LinearEncoder},
    },
    loss::{LossFn, SaeLoss},
    optimization::{Adam, AdamConfig},
};

fn random_input(shape: &[usize], rng: &mut StdRng) -> ArrayD<f32> {
    let dist = Uniform::new_inclusive(-1f32, 1.).unwrap();
    Array::random_using(IxDyn(shape), dist, rng)
}

#[test]
fn encoder_on_zeros() {
    let mut rng = StdRng::seed_from_u64(0);
    let encoder = LinearEncoder::new(4, 8, None, &mut rng).unwrap();

    let x = ArrayD::zeros(IxDyn(&[2, 4]));
    let learned = encoder.forward(x.view()).unwrap();

    assert_eq!(learned.shape(), &[2, 8]);
    assert!(learned.iter().all(|&v| v >= 0.));
}

#[test]
fn encoder_with_components() {
    let mut rng = StdRng::seed_from_u64(1);
    let encoder = LinearEncoder::new(4, 8, Some(3), &mut rng).unwrap();

    assert_eq!(encoder.weight().shape(), &[3, 8, 4]);
    assert_eq!(encoder.bias().shape(), &[3, 8]);

    let x = random_input(&[5, 3, 4], &mut rng);
    let learned = encoder.forward(x.view()).unwrap();
    assert_eq!(learned.shape(), &[5, 3, 8]);
}

#[test]
fn round_trip_keeps_the_input_shape() {
    let mut rng = StdRng::seed_from_u64(2);
    for n_components in [None, Some(2)] {
        let encoder = LinearEncoder::new(6, 12, n_components, &mut rng).unwrap();
        let decoder =
            LinearDecoder::new(12, 6, n_components, DecoderBias::Untied, &mut rng).unwrap();

        let shape = match n_components {
            Some(n) => vec![7, n, 6],
            None => vec![7, 6],
        };
        let x = random_input(&shape, &mut rng);

        let learned = encoder.forward(x.view()).unwrap();
        let decoded = decoder.forward(learned.view()).unwrap();
        assert_eq!(decoded.shape(), x.shape());
    }
}

#[test]
fn learned_activations_are_non_negative() {
    let mut rng = StdRng::seed_from_u64(3);
    let sae = SparseAutoencoder::new(SparseAutoencoderConfig::new(4, 16, Some(2)), &mut rng)
        .unwrap();

    let x = random_input(&[32, 2, 4], &mut rng).mapv(|v| -v.abs() - 1.);
    let result = sae.forward(x.view()).unwrap();

    assert!(result.learned_activations().iter().all(|&v| v >= 0.));
}

#[test]
fn reset_details_cover_every_component() {
    let mut rng = StdRng::seed_from_u64(4);

    for outer_bias in [OuterBiasMode::Fixed, OuterBiasMode::Trainable] {
        let config = SparseAutoencoderConfig::new(4, 8, Some(3)).with_outer_bias(outer_bias);
        let sae = SparseAutoencoder::new(config, &mut rng).unwrap();

        let extra = usize::from(outer_bias == OuterBiasMode::Trainable);
        let expected = sae.encoder().reset_optimizer_parameter_details().len()
            + sae.decoder().reset_optimizer_parameter_details().len()
            + extra;

        assert_eq!(sae.reset_optimizer_parameter_details().len(), expected);
    }
}

#[test]
fn reset_twice_keeps_shapes() {
    let mut rng = StdRng::seed_from_u64(5);
    let config = SparseAutoencoderConfig::new(4, 8, Some(3)).with_decoder_bias(DecoderBias::Untied);
    let mut sae = SparseAutoencoder::new(config, &mut rng).unwrap();

    let before = sae.encoder().weight().view().to_owned();
    sae.reset_parameters(&mut rng).unwrap();
    sae.reset_parameters(&mut rng).unwrap();

    assert_eq!(sae.encoder().weight().shape(), &[3, 8, 4]);
    assert_eq!(sae.encoder().bias().shape(), &[3, 8]);
    assert_eq!(sae.decoder().weight().shape(), &[3, 4, 8]);
    assert_eq!(sae.decoder().bias().map(|b| b.shape().to_vec()), Some(vec![3, 4]));
    assert_eq!(sae.tied_bias().shape(), &[3, 4]);
    assert_ne!(sae.encoder().weight().view(), before.view());
}

#[test]
fn kaiming_bounds_hold() {
    let mut rng = StdRng::seed_from_u64(6);
    let encoder = LinearEncoder::new(64, 32, None, &mut rng).unwrap();

    let bound = 2f32.sqrt() * (3. / 64f32).sqrt();
    assert!(encoder.weight().view().iter().all(|v| v.abs() <= bound));

    let bias_bound = 1. / 64f32.sqrt();
    assert!(encoder.bias().view().iter().all(|v| v.abs() <= bias_bound));
}

#[test]
fn rejects_inputs_that_disagree_with_the_config() {
    let mut rng = StdRng::seed_from_u64(7);
    let sae = SparseAutoencoder::new(SparseAutoencoderConfig::new(4, 8, None), &mut rng).unwrap();

    let x = ArrayD::zeros(IxDyn(&[2, 5]));
    assert!(matches!(
        sae.forward(x.view()),
        Err(SaeErr::ShapeMismatch { .. })
    ));

    let x = ArrayD::zeros(IxDyn(&[2, 1, 4]));
    assert!(matches!(
        sae.forward(x.view()),
        Err(SaeErr::ComponentMismatch { .. })
    ));
}

#[test]
fn optimizer_state_reset_after_resampling() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut sae = SparseAutoencoder::new(SparseAutoencoderConfig::new(4, 8, Some(2)), &mut rng)
        .unwrap();
    let mut adam = Adam::new(AdamConfig::default(), sae.parameters());

    let grads = sae
        .parameters()
        .iter()
        .map(|param| ArrayD::<f32>::ones(IxDyn(param.shape())))
        .collect::<Vec<_>>();
    let views = grads.iter().map(|g| g.view()).collect::<Vec<_>>();
    adam.step(&mut sae.parameters_mut(), &views).unwrap();

    let details = sae.reset_optimizer_parameter_details();
    adam.reset_neurons_state(&details, &[3], Some(1)).unwrap();

    let encoder_v = adam.first_moment(sae.encoder().weight().id()).unwrap();
    let reset = encoder_v.index_axis(Axis(0), 1);
    assert!(reset.index_axis(Axis(0), 3).iter().all(|&v| v == 0.));
    assert!(reset.index_axis(Axis(0), 2).iter().all(|&v| v != 0.));
    assert!(
        encoder_v
            .index_axis(Axis(0), 0)
            .index_axis(Axis(0), 3)
            .iter()
            .all(|&v| v != 0.)
    );

    let decoder_s = adam.second_moment(sae.decoder().weight().id()).unwrap();
    let reset = decoder_s.index_axis(Axis(0), 1);
    assert!(reset.index_axis(Axis(1), 3).iter().all(|&v| v == 0.));

    // the fixed tied bias has no optimizer state
    assert!(adam.first_moment(sae.tied_bias().id()).is_none());
}

#[test]
fn resampling_with_a_trainable_tied_bias() {
    let mut rng = StdRng::seed_from_u64(10);
    let config = SparseAutoencoderConfig::new(4, 8, None).with_outer_bias(OuterBiasMode::Trainable);
    let mut sae = SparseAutoencoder::new(config, &mut rng).unwrap();
    let mut adam = Adam::new(AdamConfig::default(), sae.parameters());

    let grads = sae
        .parameters()
        .iter()
        .map(|param| ArrayD::<f32>::ones(IxDyn(param.shape())))
        .collect::<Vec<_>>();
    let views = grads.iter().map(|g| g.view()).collect::<Vec<_>>();
    adam.step(&mut sae.parameters_mut(), &views).unwrap();

    // learnt feature 6 has no counterpart among the 4 input features
    let details = sae.reset_optimizer_parameter_details();
    adam.reset_neurons_state(&details, &[6], None).unwrap();

    let encoder_v = adam.first_moment(sae.encoder().weight().id()).unwrap();
    assert!(encoder_v.index_axis(Axis(0), 6).iter().all(|&v| v == 0.));
    assert!(encoder_v.index_axis(Axis(0), 1).iter().all(|&v| v != 0.));

    let decoder_v = adam.first_moment(sae.decoder().weight().id()).unwrap();
    assert!(decoder_v.index_axis(Axis(1), 6).iter().all(|&v| v == 0.));

    let bias_v = adam.first_moment(sae.tied_bias().id()).unwrap();
    let bias_s = adam.second_moment(sae.tied_bias().id()).unwrap();
    assert_eq!(bias_v.shape(), &[4]);
    assert!(bias_v.iter().chain(bias_s.iter()).all(|&v| v == 0.));
}

#[test]
fn loss_is_per_component() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut sae = SparseAutoencoder::new(SparseAutoencoderConfig::new(4, 8, Some(3)), &mut rng)
        .unwrap();

    let x = random_input(&[16, 3, 4], &mut rng);
    sae.initialize_tied_parameters(x.view()).unwrap();

    let result = sae.forward(x.view()).unwrap();
    let loss = SaeLoss::new(1e-3).loss(x.view(), &result).unwrap();

    assert_eq!(loss.shape(), &[3]);
    assert!(loss.iter().all(|&v| v.is_finite() && v >= 0.));
}
