//! The 30-day breathwork cycle.

use crate::errors::CalendarError;
use crate::models::ProgramDayView;
use chrono::NaiveDate;
use std::fmt;

pub const PROGRAM_LENGTH: u32 = 30;

const VIDEO_IDS: [&str; PROGRAM_LENGTH as usize] = [
    "lzid3my-ZBM",
    "2jRcLxPbNW4",
    "CoAOwT5Ewss",
    "dORVLShzlIk",
    "XMwNaticOAI",
    "4rmZR5om0o4",
    "5Buvu8ppyXg",
    "3wF5HIkjKps",
    "p4lOKSSUx6o",
    "Jgz8JZkMYh8",
    "fg-IuAYGWbQ",
    "HiE13ppUyZI",
    "g2XCLPiMQwU",
    "vwBDGsXIU-U",
    "xlyzZpwnj_w",
    "zZTeBfSTBRY",
    "TKlxVp2gjbM",
    "yjiK1kpMRmg",
    "isO2ie6AVGY",
    "ZT4HTNyOIMo",
    "PHynnwq-iDo",
    "p7jVTgofgvQ",
    "3mgctg0yadw",
    "DYezzTG5eoQ",
    "FOhxW4K43EM",
    "SQFdWTxkqjY",
    "ILQTgGyQ6mg",
    "0nQm-M_mkuQ",
    "dPBX2CttmsU",
    "KkBkdGvm76g",
];

/// A position in the cycle, always within `1..=30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramDay(u8);

impl ProgramDay {
    pub fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ProgramDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}", self.0)
    }
}

/// Maps an absolute day count onto the cycle. Day 0 is treated as day 1.
pub fn day_for_absolute_day(n: u32) -> ProgramDay {
    let n = n.max(1);
    ProgramDay(((n - 1) % PROGRAM_LENGTH + 1) as u8)
}

/// Day number of `today` in a program that started on `start`, where the
/// start day itself is day 1.
pub fn absolute_day_number(start: NaiveDate, today: NaiveDate) -> Result<u32, CalendarError> {
    let elapsed = (today - start).num_days();
    if elapsed < 0 {
        return Err(CalendarError::StartInFuture {
            start: start.to_string(),
            today: today.to_string(),
        });
    }
    Ok(elapsed as u32 + 1)
}

pub fn video_reference(day: ProgramDay) -> &'static str {
    VIDEO_IDS[usize::from(day.0 - 1)]
}

pub fn embed_url(day: ProgramDay) -> String {
    format!(
        "https://www.youtube.com/embed/{}?enablejsapi=1",
        video_reference(day)
    )
}

pub fn program_day_view(absolute_day: u32) -> ProgramDayView {
    let day = day_for_absolute_day(absolute_day);
    ProgramDayView {
        day_index: day.index(),
        video_id: video_reference(day).to_string(),
        embed_url: embed_url(day),
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CalendarError::InvalidDate(value.to_string()))
}
