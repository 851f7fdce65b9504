#[path = "adversarial/authority.rs"]
mod authority;

#[path = "adversarial/contention.rs"]
mod contention;
