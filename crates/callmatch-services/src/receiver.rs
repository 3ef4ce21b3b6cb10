//! Receiver resolution
//!
//! Picks the single contact phone, among a row's candidates, that the
//! caller actually dialled. The policy is first-match-wins: destinations
//! are visited in call-log order (latest call first) and, for each one,
//! the row's candidates in declared order (contact 1, 2, 3). The first
//! pair whose representations intersect is the resolved receiver.

use callmatch_core::models::{CallEvent, ContactRow};
use callmatch_core::{NormalizedNumber, PhoneNormalizer};
use std::collections::HashSet;

/// A row's contact phone prepared for matching
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Zero-based position among the row's contacts
    pub index: usize,
    pub person: Option<String>,
    pub number: NormalizedNumber,
}

/// The receiver chosen for a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReceiver {
    /// Destination digits as observed in the call log
    pub number: String,
    /// Position of the matching contact phone
    pub contact_index: usize,
    pub contact_person: Option<String>,
}

/// Non-empty contact phones of `row`, in declared order
pub fn candidates(row: &ContactRow, normalizer: &PhoneNormalizer) -> Vec<Candidate> {
    row.contacts
        .iter()
        .enumerate()
        .map(|(index, contact)| Candidate {
            index,
            person: contact.person.clone(),
            number: normalizer.normalized(contact.phone_str()),
        })
        .filter(|c| !c.number.is_empty())
        .collect()
}

/// Distinct non-empty destinations in the order they first appear
pub fn distinct_destinations(
    calls: &[&CallEvent],
    normalizer: &PhoneNormalizer,
) -> Vec<NormalizedNumber> {
    let mut seen = HashSet::new();
    calls
        .iter()
        .map(|call| call.destination_digits())
        .filter(|digits| !digits.is_empty() && seen.insert(digits.clone()))
        .map(|digits| normalizer.normalized(&digits))
        .collect()
}

/// First-match-wins receiver resolution
pub fn resolve_receiver(
    destinations: &[NormalizedNumber],
    candidates: &[Candidate],
) -> Option<ResolvedReceiver> {
    destinations.iter().find_map(|destination| {
        candidates
            .iter()
            .find(|candidate| destination.matches(&candidate.number))
            .map(|candidate| ResolvedReceiver {
                number: destination.digits().to_string(),
                contact_index: candidate.index,
                contact_person: candidate.person.clone(),
            })
    })
}

/// Calls whose destination is equivalent to the resolved receiver
pub fn calls_to<'a>(
    calls: &[&'a CallEvent],
    receiver: &ResolvedReceiver,
    normalizer: &PhoneNormalizer,
) -> Vec<&'a CallEvent> {
    let target = normalizer.normalized(&receiver.number);
    calls
        .iter()
        .copied()
        .filter(|call| normalizer.normalized(&call.dst).matches(&target))
        .collect()
}
