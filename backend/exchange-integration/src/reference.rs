//! Exchange reference numbers: `YYYYMMDD` + member code + zero-padded
//! per-day sequence. Uniqueness rests entirely on the sequence store's atomic
//! fetch-and-increment; nothing here counts existing rows.

use std::sync::Arc;

use common_utils::consts::REFERENCE_SEQUENCE_DIGITS;
use domain_types::{lift, CustomResult, ExchangeError};
use interfaces::SequenceStore;
use time::{Date, OffsetDateTime};

pub struct ReferenceNumberGenerator {
    sequences: Arc<dyn SequenceStore>,
}

impl ReferenceNumberGenerator {
    pub fn new(sequences: Arc<dyn SequenceStore>) -> Self {
        Self { sequences }
    }

    /// Next reference number for today (UTC).
    pub async fn generate(&self, member_id: &str) -> CustomResult<String, ExchangeError> {
        self.generate_on(OffsetDateTime::now_utc().date(), member_id)
            .await
    }

    pub async fn generate_on(
        &self,
        date: Date,
        member_id: &str,
    ) -> CustomResult<String, ExchangeError> {
        let prefix = format!(
            "{:04}{:02}{:02}{member_id}",
            date.year(),
            u8::from(date.month()),
            date.day(),
        );
        let sequence = lift(self.sequences.next_for_prefix(&prefix).await)?;
        Ok(format!(
            "{prefix}{sequence:0width$}",
            width = REFERENCE_SEQUENCE_DIGITS
        ))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::stores::MemorySequenceStore;

    fn generator() -> ReferenceNumberGenerator {
        ReferenceNumberGenerator::new(Arc::new(MemorySequenceStore::default()))
    }

    #[tokio::test]
    async fn reference_numbers_are_date_member_sequence() {
        let gen = generator();
        let first = gen.generate_on(date!(2026 - 08 - 27), "10123").await.unwrap();
        let second = gen.generate_on(date!(2026 - 08 - 27), "10123").await.unwrap();
        assert_eq!(first, "2026082710123000001");
        assert_eq!(second, "2026082710123000002");
    }

    #[tokio::test]
    async fn sequence_resets_per_day_and_member() {
        let gen = generator();
        let today = gen.generate_on(date!(2026 - 08 - 27), "10123").await.unwrap();
        let tomorrow = gen.generate_on(date!(2026 - 08 - 28), "10123").await.unwrap();
        let other_member = gen.generate_on(date!(2026 - 08 - 27), "20456").await.unwrap();
        assert!(tomorrow.ends_with("000001"));
        assert!(other_member.ends_with("000001"));
        assert_ne!(today, tomorrow);
        assert_ne!(today, other_member);
    }

    #[tokio::test]
    async fn concurrent_generation_never_collides() {
        let gen = Arc::new(generator());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let gen = Arc::clone(&gen);
            handles.push(tokio::spawn(async move {
                gen.generate_on(date!(2026 - 08 - 27), "10123").await.unwrap()
            }));
        }
        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen.len(), 16);
    }
}
