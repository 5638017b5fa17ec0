extern crate av_codec as codec;
extern crate av_data as data;

#[macro_use]
extern crate av_bitstream as bitstream;

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[cfg(test)]
extern crate interpolate_name;

extern crate num_complex as complex;

#[macro_use]
extern crate log;

mod fft;
mod interp;
mod lpc;
mod maths;
mod model;
mod nlp;
mod quantise;
mod sine;
mod synth;

pub mod av;
pub mod bitpack;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod instance;
pub mod mode;
pub mod state;

pub use crate::instance::Codec2;
pub use crate::mode::Mode;
