//! GrcHub - Central wiring of the GRC services

use std::sync::Arc;

use audit::{AuditEntryDraft, AuditExport, AuditTrail, Evidence, EvidenceDraft, EvidenceStore};
use catalog::{CatalogRepository, Control, ControlStatus, InMemoryCatalog};
use events::{Event, EventBus, EventType, PublishReport};
use notify::{NotificationEngine, NotificationRule};
use risk::{RiskAssessment, RiskCategory, RiskInput, RiskRegister, TravelRiskInput, TravelRiskScore};
use serde_json::json;
use shared::{GrcConfig, GrcError, Result, Severity, TenantId, TopicPattern};
use tracing::{info, warn};
use webhooks::{SignatureHeaders, WebhookProvider, WebhookVerifier};

/// Central orchestrator owning one instance of each service
pub struct GrcHub {
    config: GrcConfig,
    bus: Arc<EventBus>,
    trail: Arc<AuditTrail>,
    evidence: Arc<EvidenceStore>,
    risks: Arc<RiskRegister>,
    notifications: Arc<NotificationEngine>,
    catalog: Arc<dyn CatalogRepository>,
    webhooks: WebhookVerifier,
}

impl GrcHub {
    /// Create a hub with an empty in-memory catalog
    pub fn new(config: GrcConfig) -> Result<Self> {
        Self::with_catalog(config, Arc::new(InMemoryCatalog::new()))
    }

    /// Create a hub whose catalog holds the starter frameworks
    pub fn seeded(config: GrcConfig) -> Result<Self> {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog::seed::seed(catalog.as_ref())?;
        Self::with_catalog(config, catalog)
    }

    pub fn with_catalog(config: GrcConfig, catalog: Arc<dyn CatalogRepository>) -> Result<Self> {
        config.validate()?;

        let bus = Arc::new(EventBus::new(config.event_history_capacity));
        let trail = Arc::new(AuditTrail::new());
        let notifications = Arc::new(NotificationEngine::default());

        bus.set_audit_sink(trail.clone())?;
        bus.subscribe("notifications", TopicPattern::any(), notifications.clone())?;

        for rule in &config.notification_rules {
            notifications.add_rule(NotificationRule::from(rule.clone()))?;
        }

        let webhooks = WebhookVerifier::from_config(&config)?;

        info!(
            history = config.event_history_capacity,
            rules = config.notification_rules.len(),
            "GRC hub ready"
        );

        Ok(Self {
            config,
            bus,
            trail,
            evidence: Arc::new(EvidenceStore::new()),
            risks: Arc::new(RiskRegister::new()),
            notifications,
            catalog,
            webhooks,
        })
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &GrcConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn audit_trail(&self) -> &Arc<AuditTrail> {
        &self.trail
    }

    pub fn evidence(&self) -> &Arc<EvidenceStore> {
        &self.evidence
    }

    pub fn risks(&self) -> &Arc<RiskRegister> {
        &self.risks
    }

    pub fn notifications(&self) -> &Arc<NotificationEngine> {
        &self.notifications
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogRepository> {
        &self.catalog
    }

    pub fn webhooks_mut(&mut self) -> &mut WebhookVerifier {
        &mut self.webhooks
    }

    // ========== Risk ==========

    /// Score a risk, store it, and publish `risk.assessed`.
    ///
    /// High and critical results also publish `risk.threshold_exceeded`.
    pub fn assess_risk(
        &self,
        tenant_id: &TenantId,
        actor: &str,
        title: &str,
        input: RiskInput,
    ) -> Result<RiskAssessment> {
        let assessment = self.risks.assess(tenant_id, title, Some(actor), input)?;
        let score = &assessment.score;

        self.trail.record(
            AuditEntryDraft::new(tenant_id.clone(), actor, "risk.assessed", "risk")
                .resource(assessment.id.clone())
                .details(json!({
                    "residual": score.residual,
                    "category": score.category,
                })),
        )?;

        let payload = json!({
            "riskId": assessment.id,
            "title": assessment.title,
            "inherent": score.inherent,
            "controlEffectiveness": score.control_effectiveness,
            "residual": score.residual,
            "category": score.category,
        });
        self.publish(
            Event::new(EventType::RISK_ASSESSED, tenant_id.clone(), "risk")?
                .with_severity(score.category.severity())
                .with_payload(payload.clone()),
        );

        if score.category >= RiskCategory::High {
            let mut payload = payload;
            payload["message"] = json!(format!(
                "Risk '{}' is {} (residual {:.1})",
                assessment.title, score.category, score.residual
            ));
            self.publish(
                Event::new(EventType::RISK_THRESHOLD_EXCEEDED, tenant_id.clone(), "risk")?
                    .with_severity(score.category.severity())
                    .with_payload(payload),
            );
        }

        Ok(assessment)
    }

    /// Score a trip and publish `risk.travel_assessed`
    pub fn assess_travel(
        &self,
        tenant_id: &TenantId,
        actor: &str,
        destination: &str,
        input: TravelRiskInput,
    ) -> Result<TravelRiskScore> {
        let score = risk::travel_risk(input)?;

        self.trail.record(
            AuditEntryDraft::new(tenant_id.clone(), actor, "risk.travel_assessed", "travel")
                .resource(destination)
                .details(json!({ "score": score.score, "category": score.category })),
        )?;
        self.publish(
            Event::new("risk.travel_assessed", tenant_id.clone(), "risk")?
                .with_severity(score.category.severity())
                .with_payload(json!({
                    "destination": destination,
                    "score": score.score,
                    "category": score.category,
                })),
        );
        Ok(score)
    }

    // ========== Evidence ==========

    /// Store evidence for a catalog control and publish `evidence.collected`.
    ///
    /// When the draft names a framework, the control must exist in the catalog.
    pub fn collect_evidence(&self, draft: EvidenceDraft, content: &[u8]) -> Result<Evidence> {
        if let Some(framework_id) = &draft.framework_id {
            if self.catalog.get_control(framework_id, &draft.control_id)?.is_none() {
                return Err(GrcError::not_found(
                    "Control",
                    format!("{}:{}", framework_id, draft.control_id),
                ));
            }
        }

        let evidence = self.evidence.collect(draft, content)?;

        self.trail.record(
            AuditEntryDraft::new(
                evidence.tenant_id.clone(),
                evidence.collected_by.clone(),
                "evidence.collected",
                "evidence",
            )
            .resource(evidence.id.clone())
            .details(json!({
                "controlId": evidence.control_id,
                "contentHash": evidence.content_hash,
                "type": evidence.evidence_type,
            })),
        )?;
        self.publish(
            Event::new(EventType::EVIDENCE_COLLECTED, evidence.tenant_id.clone(), "evidence")?
                .with_payload(json!({
                    "evidenceId": evidence.id,
                    "controlId": evidence.control_id,
                    "title": evidence.title,
                })),
        );
        Ok(evidence)
    }

    /// Approve or reject evidence and publish `evidence.reviewed`
    pub fn review_evidence(
        &self,
        evidence_id: &str,
        approve: bool,
        reviewer: &str,
        notes: Option<&str>,
    ) -> Result<Evidence> {
        let evidence = self.evidence.review(evidence_id, approve, reviewer, notes)?;

        self.trail.record(
            AuditEntryDraft::new(
                evidence.tenant_id.clone(),
                reviewer,
                "evidence.reviewed",
                "evidence",
            )
            .resource(evidence.id.clone())
            .details(json!({ "status": evidence.status })),
        )?;
        self.publish(
            Event::new(EventType::EVIDENCE_REVIEWED, evidence.tenant_id.clone(), "evidence")?
                .with_severity(if approve { Severity::Info } else { Severity::Medium })
                .with_payload(json!({
                    "evidenceId": evidence.id,
                    "status": evidence.status,
                    "reviewer": reviewer,
                })),
        );
        Ok(evidence)
    }

    /// Export a tenant's audit trail and evidence, publishing `audit.exported`
    pub fn export_audit(&self, tenant_id: &TenantId, actor: &str) -> Result<AuditExport> {
        let export = audit::export(&self.trail, &self.evidence, tenant_id, actor)?;
        self.publish(
            Event::new(EventType::AUDIT_EXPORTED, tenant_id.clone(), "audit")?.with_payload(json!({
                "entries": export.entries.len(),
                "evidence": export.evidence.len(),
                "integrityHash": export.integrity_hash,
            })),
        );
        Ok(export)
    }

    // ========== Catalog ==========

    /// Change a control's status and publish `control.status_changed`
    pub fn update_control_status(
        &self,
        tenant_id: &TenantId,
        actor: &str,
        framework_id: &str,
        control_id: &str,
        status: ControlStatus,
    ) -> Result<Control> {
        let previous = self.catalog.update_status(framework_id, control_id, status)?;
        let control = self
            .catalog
            .get_control(framework_id, control_id)?
            .ok_or_else(|| GrcError::not_found("Control", format!("{}:{}", framework_id, control_id)))?;

        self.trail.record(
            AuditEntryDraft::new(tenant_id.clone(), actor, "control.status_changed", "control")
                .resource(control.key())
                .details(json!({ "from": previous, "to": status })),
        )?;

        // Losing implementation is worth attention
        let severity = if status == ControlStatus::NotImplemented && previous != status {
            Severity::Medium
        } else {
            Severity::Info
        };
        self.publish(
            Event::new(EventType::CONTROL_STATUS_CHANGED, tenant_id.clone(), "catalog")?
                .with_severity(severity)
                .with_payload(json!({
                    "frameworkId": framework_id,
                    "controlId": control_id,
                    "from": previous,
                    "to": status,
                })),
        );
        Ok(control)
    }

    // ========== Webhooks ==========

    /// Verify, parse and publish an inbound webhook.
    ///
    /// Accepted webhooks are audited as `webhook.received`. A bad signature
    /// or an unparseable body is recorded as a failed `webhook.rejected`
    /// entry before the error is returned.
    pub fn receive_webhook(
        &self,
        provider: WebhookProvider,
        headers: &SignatureHeaders,
        body: &[u8],
        default_tenant: &TenantId,
    ) -> Result<PublishReport> {
        let actor = format!("webhook:{}", provider);

        let event = match self
            .webhooks
            .verify(provider, headers, body)
            .and_then(|_| webhooks::ingest(provider, body, default_tenant))
        {
            Ok(event) => event,
            Err(e) => {
                warn!(provider = %provider, error = %e, "webhook rejected");
                self.trail.record(
                    AuditEntryDraft::new(default_tenant.clone(), actor, "webhook.rejected", "webhook")
                        .failed()
                        .details(json!({ "reason": e.to_string() })),
                )?;
                return Err(e);
            }
        };

        self.trail.record(
            AuditEntryDraft::new(event.tenant_id.clone(), actor, "webhook.received", "webhook")
                .resource(event.id.clone())
                .details(json!({
                    "eventType": event.event_type,
                    "bytes": body.len(),
                })),
        )?;
        self.bus.publish(event)
    }

    /// Publish on the bus; a bus failure is logged, never returned to the
    /// caller whose operation already succeeded.
    fn publish(&self, event: Event) {
        let event_type = event.event_type.clone();
        if let Err(e) = self.bus.publish(event) {
            warn!(event_type = %event_type, error = %e, "failed to publish event");
        }
    }
}

impl std::fmt::Debug for GrcHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrcHub")
            .field("bus", &self.bus)
            .field("webhooks", &self.webhooks)
            .finish_non_exhaustive()
    }
}
