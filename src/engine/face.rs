//! Acceptance rule for face-embedding matches produced by an external
//! recognizer. A probe matches an enrolled embedding only when their
//! Euclidean distance is strictly below this cutoff; at or above it the
//! recognizer must report "no match".

pub const FACE_MATCH_THRESHOLD: f64 = 1.0;
