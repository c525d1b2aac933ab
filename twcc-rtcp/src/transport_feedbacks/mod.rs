//! Transport layer feedback messages (RFC 4585, PT=205).

pub mod transport_layer_cc;
