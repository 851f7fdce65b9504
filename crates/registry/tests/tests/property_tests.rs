#[path = "property/feedback_sequencing.rs"]
mod feedback_sequencing;
