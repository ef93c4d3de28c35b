use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::dialogue::finalizer::Report;
use crate::error::Result;

use super::{ReportStore, StoredReport};

/// Process-local store used when no reports service is configured.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: RwLock<Vec<StoredReport>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn submit(&self, report: &Report) -> Result<()> {
        let id = Uuid::new_v4().simple().to_string();
        tracing::info!("Report {} kept in memory for flock {}", id, report.flock_id);
        self.reports
            .write()
            .push(StoredReport::from_report(report, Some(id)));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredReport>> {
        Ok(self.reports.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::draft::{Amount, AmountBucket, BirdType, CompletedDraft, Height, HeightBucket};
    use crate::dialogue::finalizer::ReportFinalizer;
    use crate::dialogue::species::Species;

    fn report(flock: &str) -> Report {
        ReportFinalizer::new("בוט ציפורים", flock, "https://birds.example.com").finalize(
            CompletedDraft {
                reporter_id: "user-1".to_string(),
                latitude: 32.08,
                longitude: 34.8,
                bird_type: BirdType::Known(Species::Agur),
                amount: Amount::Bucket(AmountBucket::High),
                height: Height::Bucket(HeightBucket::High),
            },
            chrono::Utc::now(),
        )
    }

    #[tokio::test]
    async fn submitted_reports_are_listed() {
        let store = MemoryReportStore::new();
        assert!(store.is_empty());

        store.submit(&report("2357")).await.unwrap();
        store.submit(&report("2357")).await.unwrap();

        let reports = store.list().await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(reports[0].bird_type, "עגור");
        assert_eq!(reports[0].location.lan, Some(32.08));
        assert_eq!(reports[0].image, "https://birds.example.com/assets/agur.jpg");
        assert_ne!(reports[0].id, reports[1].id);
    }
}
