// File: src/reminder/classify.rs
use crate::model::ParsedActionItem;
use chrono::NaiveDate;
use strum::EnumIter;

/// Urgency class of an open action item.
///
/// Only three points of the countdown are reminded: past due, the due day
/// itself and exactly three days before. Items due in 1, 2 or 4+ days fall
/// into no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Bucket {
    Overdue,
    DueToday,
    DueInThreeDays,
}

impl Bucket {
    pub fn for_days_left(days_left: i64) -> Option<Self> {
        match days_left {
            d if d < 0 => Some(Bucket::Overdue),
            0 => Some(Bucket::DueToday),
            3 => Some(Bucket::DueInThreeDays),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    pub overdue: Vec<ParsedActionItem>,
    pub due_today: Vec<ParsedActionItem>,
    pub due_in_3_days: Vec<ParsedActionItem>,
}

impl Buckets {
    pub fn get(&self, bucket: Bucket) -> &[ParsedActionItem] {
        match bucket {
            Bucket::Overdue => &self.overdue,
            Bucket::DueToday => &self.due_today,
            Bucket::DueInThreeDays => &self.due_in_3_days,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<ParsedActionItem> {
        match bucket {
            Bucket::Overdue => &mut self.overdue,
            Bucket::DueToday => &mut self.due_today,
            Bucket::DueInThreeDays => &mut self.due_in_3_days,
        }
    }

    pub fn total(&self) -> usize {
        self.overdue.len() + self.due_today.len() + self.due_in_3_days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Sorts items into buckets relative to `today`, keeping input order.
/// Items whose due date does not parse are skipped.
pub fn classify<I>(items: I, today: NaiveDate) -> Buckets
where
    I: IntoIterator<Item = ParsedActionItem>,
{
    let mut buckets = Buckets::default();
    for item in items {
        let Some(due) = item.due_date() else {
            log::debug!("Ignoring unparseable due date '{}' for '{}'", item.due, item.task);
            continue;
        };
        let days_left = (due - today).num_days();
        if let Some(bucket) = Bucket::for_days_left(days_left) {
            buckets.get_mut(bucket).push(item);
        }
    }
    buckets
}
