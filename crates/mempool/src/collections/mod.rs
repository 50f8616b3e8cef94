//! Internal containers with an explicit growth policy

mod growable;

pub use growable::GrowableArray;
