#[path = "e2e/reputation.rs"]
mod reputation;

#[path = "e2e/validation.rs"]
mod validation;

#[path = "e2e/identity_lifecycle.rs"]
mod identity_lifecycle;

#[path = "e2e/wallet_binding.rs"]
mod wallet_binding;
