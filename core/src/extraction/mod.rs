pub mod dates;
pub mod person_name;
pub mod private;
pub mod sequence_type;
pub mod tags;

pub use dates::{parse_da, parse_dt, parse_tm};
pub use person_name::{extract_patient_name, parse_person_name};
pub use private::{
    extract_b_value, extract_gradient_direction, extract_pulse_sequence_name, extract_slice_timing,
};
pub use sequence_type::{detect_sequence_type, SequenceSignature};
pub use tags::*;
