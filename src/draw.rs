use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{MAIN_NUMBERS, MAX_NUMBER};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawId(pub u32);

impl DrawId {
    /// Accepts `1850`, `第1850回` and full-width digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw
            .chars()
            .filter_map(normalize_digit)
            .collect();
        if digits.is_empty() {
            return None;
        }
        let rest_ok = raw
            .trim()
            .chars()
            .all(|ch| normalize_digit(ch).is_some() || matches!(ch, '第' | '回' | ',' | ' '));
        if !rest_ok {
            return None;
        }
        digits.parse::<u32>().ok().map(DrawId)
    }
}

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) fn normalize_digit(ch: char) -> Option<char> {
    match ch {
        '0'..='9' => Some(ch),
        '０'..='９' => char::from_u32(ch as u32 - '０' as u32 + '0' as u32),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub draw_id: DrawId,
    pub draw_date: NaiveDate,
    /// Valid main numbers only; missing source cells are dropped, never zeroed.
    pub main_numbers: Vec<u8>,
    pub bonus_number: Option<u8>,
}

impl DrawRecord {
    pub fn new(
        draw_id: DrawId,
        draw_date: NaiveDate,
        main_numbers: impl IntoIterator<Item = Option<u8>>,
        bonus_number: Option<u8>,
    ) -> CoreResult<Self> {
        let main_numbers: Vec<u8> = main_numbers.into_iter().flatten().collect();
        let record = Self {
            draw_id,
            draw_date,
            main_numbers,
            bonus_number,
        };
        record.validate(MAX_NUMBER)?;
        Ok(record)
    }

    pub fn validate(&self, max_number: u8) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidDraw {
            draw_id: self.draw_id,
            reason,
        };
        if self.main_numbers.len() > MAIN_NUMBERS {
            return Err(invalid(format!(
                "{} main numbers, at most {MAIN_NUMBERS} allowed",
                self.main_numbers.len()
            )));
        }
        let mut seen = HashSet::new();
        for &n in &self.main_numbers {
            if n == 0 || n > max_number {
                return Err(invalid(format!("main number {n} outside 1..={max_number}")));
            }
            if !seen.insert(n) {
                return Err(invalid(format!("main number {n} repeated")));
            }
        }
        if let Some(b) = self.bonus_number
            && (b == 0 || b > max_number)
        {
            return Err(invalid(format!("bonus number {b} outside 1..={max_number}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawHistory {
    draws: Vec<DrawRecord>,
}

impl DrawHistory {
    pub fn new(mut draws: Vec<DrawRecord>) -> CoreResult<Self> {
        draws.sort_by_key(|d| d.draw_id);
        if let Some(pair) = draws.windows(2).find(|w| w[0].draw_id == w[1].draw_id) {
            return Err(CoreError::DuplicateDrawId {
                draw_id: pair[0].draw_id,
            });
        }
        Ok(Self { draws })
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn latest(&self) -> Option<&DrawRecord> {
        self.draws.last()
    }

    pub fn into_inner(self) -> Vec<DrawRecord> {
        self.draws
    }
}
