//! Partial genealogical dates.
//!
//! Source records rarely carry a complete date: any of year, month, and day
//! may be absent, and what is present may be a guess or a bound rather than
//! a certainty. `chrono::NaiveDate` cannot express that, so dates are kept
//! in this partial form and only formatted by the rendering layer.

use serde::{Deserialize, Serialize};

/// How certain the recorded date components are.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DateStatus {
  Certain,
  Guess,
  /// The event happened no later than the recorded date.
  Before,
  /// The event happened no earlier than the recorded date.
  After,
  /// No date is recorded at all.
  #[default]
  Blank,
}

/// A date with any suffix of (year, month, day) possibly absent.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct PartialDate {
  pub year:   Option<i32>,
  pub month:  Option<u8>,
  pub day:    Option<u8>,
  pub status: DateStatus,
}

impl PartialDate {
  pub fn blank() -> Self {
    Self::default()
  }

  /// A fully-absent date; `Blank` status with no components.
  pub fn is_blank(&self) -> bool {
    self.year.is_none() && self.month.is_none() && self.day.is_none()
  }

  /// Chronological sort key. Missing components sort after everything
  /// known, so an undated marriage never wins "earliest".
  fn sort_key(&self) -> (i32, u8, u8) {
    (
      self.year.unwrap_or(i32::MAX),
      self.month.unwrap_or(u8::MAX),
      self.day.unwrap_or(u8::MAX),
    )
  }
}

impl PartialOrd for PartialDate {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for PartialDate {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.sort_key().cmp(&other.sort_key())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn year(y: i32) -> PartialDate {
    PartialDate { year: Some(y), ..Default::default() }
  }

  #[test]
  fn known_years_order_chronologically() {
    assert!(year(1880) < year(1912));
  }

  #[test]
  fn missing_components_sort_last() {
    assert!(year(1999) < PartialDate::blank());
    let march = PartialDate {
      year: Some(1900),
      month: Some(3),
      ..Default::default()
    };
    let undated_month = year(1900);
    assert!(march < undated_month);
  }

  #[test]
  fn blank_detection() {
    assert!(PartialDate::blank().is_blank());
    assert!(!year(1850).is_blank());
  }
}
