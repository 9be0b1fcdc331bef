//! Dates and date-times.
//!
//! Both render as `Date`. A date-time travels as an ISO 8601 timestamp; a
//! calendar date travels as `YYYY-MM-DD` through the prelude's `dateToStr`
//! and `strToDate` helpers, which keep the local calendar day stable.

use super::Direction;
use crate::emit::CodeBlock;
use typewire_core::TemporalKind;

pub fn interface() -> &'static str {
    "Date"
}

pub fn marshal(kind: TemporalKind, src: &str, dest: &str, direction: Direction) -> CodeBlock {
    let line = match (kind, direction) {
        (TemporalKind::DateTime, Direction::ToPrimitive) => format!("{} = {}.toISOString()", dest, src),
        (TemporalKind::Date, Direction::ToPrimitive) => format!("{} = dateToStr({})", dest, src),
        (TemporalKind::DateTime, Direction::FromPrimitive) => format!("{} = new Date({})", dest, src),
        (TemporalKind::Date, Direction::FromPrimitive) => format!("{} = strToDate({})", dest, src),
    };
    CodeBlock::transform(line)
}
