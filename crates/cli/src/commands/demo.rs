//! grc demo command

use std::sync::Arc;

use audit::{EvidenceDraft, EvidenceType};
use catalog::ControlStatus;
use clap::Args;
use console::style;
use hub::{Dashboard, GrcHub};
use notify::{ChannelKind, NotificationRule, RecordingChannel};
use risk::{RiskInput, TravelRiskInput};
use shared::{GrcConfig, Severity, TenantId, TopicPattern};
use tracing::info;

use crate::commands::risk::category_level;
use crate::output::{badge, field, heading, Output};

/// Seed an in-memory hub and walk through every service
#[derive(Debug, Args)]
pub struct DemoCommand {
    /// Tenant to run the walkthrough as
    #[arg(short, long, default_value = "demo")]
    pub tenant: String,

    /// Acting user recorded in the audit trail
    #[arg(short, long, default_value = "demo-user")]
    pub actor: String,
}

impl DemoCommand {
    pub fn run(&self, output: Output, config: GrcConfig) -> anyhow::Result<()> {
        let dashboard = self.walkthrough(config)?;
        output.emit(&dashboard, print_dashboard)
    }

    /// Drive the hub through a typical day and return the resulting dashboard
    pub fn walkthrough(&self, config: GrcConfig) -> anyhow::Result<Dashboard> {
        let tenant = TenantId::new(self.tenant.as_str());
        let actor = self.actor.as_str();

        let hub = GrcHub::seeded(config)?;
        let email = Arc::new(RecordingChannel::new(ChannelKind::Email));
        hub.notifications().register_channel(email.clone())?;
        if hub.notifications().rules()?.is_empty() {
            hub.notifications().add_rule(
                NotificationRule::new(
                    "high risk alerts",
                    TopicPattern::new("risk.*")?,
                    vec!["security-team".to_string()],
                )
                .with_min_severity(Severity::High)
                .with_channels(vec![ChannelKind::InApp, ChannelKind::Email]),
            )?;
        }

        info!(tenant = %tenant, "running demo walkthrough");

        hub.assess_risk(
            &tenant,
            actor,
            "Unpatched VPN appliance",
            RiskInput {
                inherent: 90.0,
                control_effectiveness: 10.0,
            },
        )?;
        hub.assess_risk(
            &tenant,
            actor,
            "Phishing of finance staff",
            RiskInput {
                inherent: risk::inherent_from_likelihood_impact(4, 4)?,
                control_effectiveness: 60.0,
            },
        )?;
        hub.assess_travel(
            &tenant,
            actor,
            "Conference abroad",
            TravelRiskInput {
                security: 40.0,
                health: 20.0,
                political: 30.0,
                infrastructure: 10.0,
            },
        )?;

        let evidence = hub.collect_evidence(
            EvidenceDraft {
                tenant_id: tenant.clone(),
                control_id: "CC6.1".to_string(),
                framework_id: Some("soc2".to_string()),
                title: "Quarterly access review".to_string(),
                evidence_type: EvidenceType::Document,
                collected_by: actor.to_string(),
            },
            b"access review export",
        )?;
        hub.review_evidence(&evidence.id, true, "auditor", Some("complete"))?;

        hub.update_control_status(&tenant, actor, "soc2", "CC8.1", ControlStatus::PartiallyImplemented)?;

        let export = hub.export_audit(&tenant, "auditor")?;
        info!(
            entries = export.entries.len(),
            hash = %export.integrity_hash,
            "audit export generated"
        );

        info!(emails = email.sent().len(), "demo finished");
        Ok(hub.dashboard(&tenant, None)?)
    }
}

fn print_dashboard(d: &Dashboard) {
    heading(&format!("Dashboard for {}", d.tenant_id));

    println!();
    heading("Compliance");
    for c in &d.compliance {
        field(&c.framework_name, format!("{:.1}%", c.score));
    }
    field("overall", format!("{:.1}%", d.overall_compliance));

    println!();
    heading("Risk");
    field("risks", d.risk.total);
    field("mean residual", format!("{:.1}", d.risk.mean_residual));
    field("max residual", format!("{:.1}", d.risk.max_residual));
    for (category, count) in &d.risk.by_category {
        field(category.as_str(), badge(&count.to_string(), category_level(*category)));
    }

    println!();
    heading("Evidence");
    field("total", d.evidence.total);
    field("pending", d.evidence.pending);
    field("approved", d.evidence.approved);
    field("rejected", d.evidence.rejected);

    println!();
    heading("Recent events");
    for event in &d.recent_events {
        println!(
            "  {} {:<28} {}",
            style(&event.timestamp).dim(),
            event.event_type,
            event.severity
        );
    }

    println!();
    field("unread notifications", d.unread_notifications);
    let chain = if d.audit_chain_valid {
        badge("intact", 0)
    } else {
        badge("BROKEN", 4)
    };
    field("audit chain", chain);
}
