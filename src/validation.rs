//! Shared form validation used on both sides of the wire.
//!
//! The modal uses these predicates to gate the submit control; the lead
//! endpoint re-checks them so a non-standard client cannot bypass them.
//! All functions here are pure: no I/O, deterministic on input.

use regex::Regex;

/// Minimum length of the problem description, after trimming.
pub const MIN_PROBLEM_LEN: usize = 10;

/// Validate email shape: `local@domain.tld` with no internal whitespace.
///
/// Deliberately minimal — one `@`-separated pair with a dotted domain is
/// enough for a lead form; deliverability is not checked here.
pub fn is_valid_email(email: &str) -> bool {
    let email_regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    email_regex.is_match(email)
}

/// Validate the free-text problem description.
pub fn is_valid_problem_text(problem: &str) -> bool {
    problem.trim().len() >= MIN_PROBLEM_LEN
}

/// Whether the form as a whole is submittable.
///
/// The submit control is enabled only when this holds: a shaped email,
/// explicit willingness to pay, and a problem description of useful length.
pub fn is_form_valid(email: &str, willing_to_pay: bool, problem: &str) -> bool {
    !email.trim().is_empty() && is_valid_email(email) && willing_to_pay
        && is_valid_problem_text(problem)
}
