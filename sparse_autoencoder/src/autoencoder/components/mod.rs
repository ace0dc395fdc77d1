mod decoder;
mod encoder;
mod linear;
mod linear_decoder;
mod linear_encoder;
mod outer_bias;
mod tied_bias;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use linear_decoder::{DecoderBias, LinearDecoder};
pub use linear_encoder::LinearEncoder;
pub use outer_bias::OuterBias;
pub use tied_bias::{TiedBias, TiedBiasPosition};
