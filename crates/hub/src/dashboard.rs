//! Per-tenant dashboard snapshot

use audit::EvidenceStatus;
use catalog::{compliance_score, ComplianceScore};
use events::Event;
use risk::RiskSummary;
use serde::{Deserialize, Serialize};
use shared::{ChannelKind, Result, TenantId};

use crate::GrcHub;

const RECENT_EVENTS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub tenant_id: TenantId,
    pub compliance: Vec<ComplianceScore>,
    /// Mean of the framework scores, 0 when the catalog is empty
    pub overall_compliance: f64,
    pub risk: RiskSummary,
    pub evidence: EvidenceCounts,
    /// Newest first
    pub recent_events: Vec<Event>,
    pub unread_notifications: usize,
    pub audit_chain_valid: bool,
}

impl GrcHub {
    /// Snapshot of everything a tenant's dashboard shows.
    ///
    /// Unread counts cover in-app notifications; `recipient` narrows them to
    /// one inbox.
    pub fn dashboard(&self, tenant_id: &TenantId, recipient: Option<&str>) -> Result<Dashboard> {
        let compliance = self
            .catalog()
            .list_frameworks()?
            .iter()
            .map(|fw| compliance_score(self.catalog().as_ref(), &fw.id))
            .collect::<Result<Vec<_>>>()?;
        let overall_compliance = if compliance.is_empty() {
            0.0
        } else {
            compliance.iter().map(|c| c.score).sum::<f64>() / compliance.len() as f64
        };

        let mut evidence = EvidenceCounts::default();
        for item in self.evidence().list(tenant_id)? {
            evidence.total += 1;
            match item.status {
                EvidenceStatus::Pending => evidence.pending += 1,
                EvidenceStatus::Approved => evidence.approved += 1,
                EvidenceStatus::Rejected => evidence.rejected += 1,
            }
        }

        let mut recent_events = self.bus().history_for_tenant(tenant_id)?;
        recent_events.truncate(RECENT_EVENTS);

        let unread_notifications = match recipient {
            Some(recipient) => self
                .notifications()
                .unread_for(recipient)?
                .iter()
                .filter(|n| &n.tenant_id == tenant_id)
                .count(),
            None => self
                .notifications()
                .for_tenant(tenant_id)?
                .iter()
                .filter(|n| n.channel == ChannelKind::InApp && !n.read)
                .count(),
        };

        Ok(Dashboard {
            tenant_id: tenant_id.clone(),
            compliance,
            overall_compliance,
            risk: self.risks().summary(tenant_id)?,
            evidence,
            recent_events,
            unread_notifications,
            audit_chain_valid: self.audit_trail().verify_chain()?.valid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit::{EvidenceDraft, EvidenceType};
    use risk::RiskInput;
    use shared::{GrcConfig, NotificationRuleConfig, Severity, TopicPattern};

    fn hub() -> GrcHub {
        let mut config = GrcConfig::default();
        config.notification_rules.push(NotificationRuleConfig {
            name: "everything".to_string(),
            event_pattern: TopicPattern::any(),
            min_severity: Severity::Info,
            channels: vec![ChannelKind::InApp],
            recipients: vec!["ciso".to_string()],
            tenant_id: None,
            enabled: true,
        });
        GrcHub::seeded(config).unwrap()
    }

    #[test]
    fn test_dashboard_snapshot() {
        let hub = hub();
        let acme = TenantId::new("acme");
        let other = TenantId::new("globex");

        hub.assess_risk(
            &acme,
            "alice",
            "Vendor breach",
            RiskInput {
                inherent: 80.0,
                control_effectiveness: 25.0,
            },
        )
        .unwrap();
        hub.assess_risk(
            &other,
            "bob",
            "Outage",
            RiskInput {
                inherent: 10.0,
                control_effectiveness: 0.0,
            },
        )
        .unwrap();
        let evidence = hub
            .collect_evidence(
                EvidenceDraft {
                    tenant_id: acme.clone(),
                    control_id: "A.5.1".to_string(),
                    framework_id: Some("iso27001".to_string()),
                    title: "Security policy".to_string(),
                    evidence_type: EvidenceType::Document,
                    collected_by: "alice".to_string(),
                },
                b"policy v3",
            )
            .unwrap();
        hub.review_evidence(&evidence.id, true, "carol", None).unwrap();

        let dashboard = hub.dashboard(&acme, None).unwrap();

        assert_eq!(dashboard.compliance.len(), 4);
        let soc2 = dashboard
            .compliance
            .iter()
            .find(|c| c.framework_id == "soc2")
            .unwrap();
        assert_eq!(soc2.score, 60.0);
        assert!(dashboard.overall_compliance > 0.0);

        assert_eq!(dashboard.risk.total, 1);
        assert_eq!(dashboard.risk.max_residual, 60.0);
        assert_eq!(
            dashboard.evidence,
            EvidenceCounts {
                total: 1,
                pending: 0,
                approved: 1,
                rejected: 0,
            }
        );

        // risk.assessed, risk.threshold_exceeded, evidence.collected, evidence.reviewed
        assert_eq!(dashboard.recent_events.len(), 4);
        assert_eq!(dashboard.recent_events[0].event_type, "evidence.reviewed");
        assert!(dashboard.recent_events.iter().all(|e| e.tenant_id == acme));

        assert_eq!(dashboard.unread_notifications, 4);
        assert!(dashboard.audit_chain_valid);
    }

    #[test]
    fn test_dashboard_recipient_filter() {
        let hub = hub();
        let acme = TenantId::new("acme");
        hub.update_control_status(&acme, "bob", "soc2", "CC8.1", catalog::ControlStatus::Implemented)
            .unwrap();

        assert_eq!(hub.dashboard(&acme, Some("ciso")).unwrap().unread_notifications, 1);
        assert_eq!(hub.dashboard(&acme, Some("nobody")).unwrap().unread_notifications, 0);

        hub.notifications().mark_all_read("ciso").unwrap();
        assert_eq!(hub.dashboard(&acme, None).unwrap().unread_notifications, 0);
    }

    #[test]
    fn test_recent_events_keep_newest() {
        let hub = GrcHub::new(GrcConfig::default()).unwrap();
        let acme = TenantId::new("acme");
        for i in 0..12 {
            hub.assess_travel(
                &acme,
                "alice",
                &format!("trip-{}", i),
                risk::TravelRiskInput {
                    security: 10.0,
                    health: 10.0,
                    political: 10.0,
                    infrastructure: 10.0,
                },
            )
            .unwrap();
        }

        let destinations: Vec<String> = hub
            .dashboard(&acme, None)
            .unwrap()
            .recent_events
            .iter()
            .map(|e| e.payload["destination"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(destinations.len(), RECENT_EVENTS);
        assert_eq!(destinations[0], "trip-11");
        assert_eq!(destinations[RECENT_EVENTS - 1], "trip-2");
    }

    #[test]
    fn test_empty_catalog() {
        let hub = GrcHub::new(GrcConfig::default()).unwrap();
        let dashboard = hub.dashboard(&TenantId::new("acme"), None).unwrap();
        assert!(dashboard.compliance.is_empty());
        assert_eq!(dashboard.overall_compliance, 0.0);
        assert_eq!(dashboard.risk.total, 0);
    }
}
