use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use hiretop::applications::{
    ApplicationFilters, ApplicationScope, ApplicationStatus, ApplyRequest, TransitionPolicy,
};
use hiretop::clock::FixedClock;
use hiretop::company::{CompanyDraft, MemberInvite};
use hiretop::config::HiringConfig;
use hiretop::documents::{Disposition, DocumentUpload, MemoryBlobStore};
use hiretop::error::AppError;
use hiretop::identity::{Actor, GateDecision, Registration, RoleName};
use hiretop::notify::MemoryNotifier;
use hiretop::offers::{ContractType, OfferDraft, OfferFilters, RemoteType};
use hiretop::store::MemoryStore;
use hiretop::talent::{
    CompletionBreakdown, EducationDraft, ExperienceDraft, ProfileDraft, SkillCatalog,
    SkillSelection, TalentProfile,
};
use hiretop::{HireTop, ServiceError};

use crate::infra::skill_catalog;

type DemoApp = HireTop<MemoryStore, MemoryBlobStore, MemoryNotifier>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the demo runs on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Only allow PENDING → REVIEWED → ACCEPTED | REJECTED status moves.
    #[arg(long)]
    pub(crate) strict_transitions: bool,
    /// Print the application listing payloads as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SkillsImportArgs {
    /// CSV export with `name` and optional `category` columns
    pub(crate) path: PathBuf,
}

pub(crate) fn run_skills_import(args: SkillsImportArgs) -> Result<(), AppError> {
    let catalog = skill_catalog(Some(&args.path))?;
    println!(
        "Imported {} skills from {}",
        catalog.len(),
        args.path.display()
    );
    for skill in catalog.iter() {
        println!("  #{:<3} {} ({})", skill.id.0, skill.name, skill.category);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        strict_transitions,
        json,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let start = Utc.from_utc_datetime(&today.and_hms_opt(9, 0, 0).unwrap_or_default());
    let config = HiringConfig {
        transitions: if strict_transitions {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        },
        ..HiringConfig::default()
    };
    let notifier = MemoryNotifier::default();
    let app: DemoApp = HireTop::with_clock(
        Arc::new(MemoryStore::with_skills(SkillCatalog::standard())),
        Arc::new(MemoryBlobStore::default()),
        Arc::new(notifier.clone()),
        config,
        Arc::new(FixedClock::new(start)),
    );

    println!("HireTop hiring demo ({today})");

    println!("\nTalent onboarding");
    let talent = verified_account(&app, "Awa", "Ndiaye", "awa@example.com", RoleName::Talent)?;
    let gate = app.access_gate(&talent)?;
    println!("- Awa registered; access gate before profile: {}", describe(&gate));
    let profile = build_profile(&app, &talent, today)?;
    let breakdown = CompletionBreakdown::of(&profile);
    println!(
        "- Profile completed: score {} (contact {} | skills {} | education {} | experience {})",
        app.talent.completion(&talent)?.value(),
        mark(breakdown.contact),
        mark(breakdown.skills),
        mark(breakdown.education),
        mark(breakdown.experience)
    );
    println!(
        "- Access gate after profile: {}",
        describe(&app.access_gate(&talent)?)
    );

    println!("\nCompany setup");
    let admin = verified_account(
        &app,
        "Aminata",
        "Diop",
        "aminata@teranga.sn",
        RoleName::CompanyAdmin,
    )?;
    println!(
        "- Aminata registered; access gate before company: {}",
        describe(&app.access_gate(&admin)?)
    );
    let company = app.companies.create_company(
        &admin,
        CompanyDraft {
            name: "Teranga Tech".to_string(),
            country: Some("Senegal".to_string()),
            address: Some("Dakar Plateau".to_string()),
            description: Some("Payments for West Africa".to_string()),
        },
    )?;
    println!("- Created {} ({})", company.name, company.id);
    let invitation = app.companies.invite_member(
        &admin,
        company.id,
        MemberInvite {
            first_name: "Cheikh".to_string(),
            last_name: "Ba".to_string(),
            email: "cheikh@teranga.sn".to_string(),
        },
    )?;
    app.identity.verify_email(invitation.user.id)?;
    let recruiter = app.identity.actor(invitation.user.id)?;
    println!(
        "- Invited recruiter {} (invitation email {})",
        invitation.user.email,
        notification_label(invitation.notification.is_sent())
    );

    let rust = SkillCatalog::standard()
        .by_name("Rust")
        .map(|skill| skill.id)
        .into_iter()
        .collect();
    let offer = app.offers.create(
        &recruiter,
        company.id,
        OfferDraft {
            title: "Backend engineer".to_string(),
            description: "Build the settlement platform in Rust.".to_string(),
            location: Some("Dakar".to_string()),
            remote_type: Some(RemoteType::Hybrid),
            contract_type: Some(ContractType::Cdi),
            skill_ids: rust,
            salary_min: Some(900_000),
            salary_max: Some(1_400_000),
            ..OfferDraft::default()
        },
    )?;
    let board = app.offers.list_published(
        OfferFilters {
            skills: vec!["rust".to_string()],
            ..OfferFilters::default()
        },
        1,
    )?;
    println!(
        "- Published \"{}\" {} (expires {}); {} offer(s) on the Rust board",
        offer.title,
        offer.status,
        offer.expire_at.date_naive(),
        board.total
    );

    println!("\nApplication lifecycle");
    let application = app.applications.apply(
        &talent,
        offer.id,
        ApplyRequest {
            message: Some("I have shipped payment systems before.".to_string()),
            use_profile_cv: true,
            document: None,
            disponibility: Some(today.to_string()),
        },
    )?;
    println!("- Awa applied -> status {}", application.status);

    let reviewed = app.applications.confirm_or_revoke_apply(
        &recruiter,
        application.id,
        ApplicationStatus::Reviewed,
    )?;
    println!("- Cheikh reviewed -> status {}", reviewed.application.status);
    let accepted = app.applications.confirm_or_revoke_apply(
        &recruiter,
        application.id,
        ApplicationStatus::Accepted,
    )?;
    println!(
        "- Cheikh accepted -> status {} (acceptance email {})",
        accepted.application.status,
        notification_label(
            accepted
                .notification
                .as_ref()
                .map(|result| result.is_sent())
                .unwrap_or(false)
        )
    );
    for message in notifier.sent_to(&talent.email) {
        println!("  - {} -> {} [{}]", message.subject, message.to, message.template);
    }

    match app
        .applications
        .apply(&talent, offer.id, ApplyRequest::default())
    {
        Err(ServiceError::Conflict(reason)) => println!("- Second application refused: {reason}"),
        Err(err) => return Err(err.into()),
        Ok(duplicate) => println!("- Unexpected duplicate application {}", duplicate.id),
    }

    println!("\nDocument access");
    let download =
        app.documents
            .open_application_document(&recruiter, application.id, Disposition::Inline)?;
    println!(
        "- Recruiter opened {} ({}, {})",
        download.file_name, download.content_type, download.content_disposition
    );
    let outsider = verified_account(
        &app,
        "Lamine",
        "Gueye",
        "lamine@globex.sn",
        RoleName::Recruiter,
    )?;
    match app
        .documents
        .open_application_document(&outsider, application.id, Disposition::Inline)
    {
        Err(err) => println!("- Outside recruiter refused: {err}"),
        Ok(_) => println!("- Outside recruiter unexpectedly read the CV"),
    }

    println!("\nRecruiter dashboard");
    let dashboard = app.companies.dashboard(&recruiter)?;
    println!(
        "- {} posts | {} applications | {} accepted | {} members",
        dashboard.total_posts,
        dashboard.total_applications,
        dashboard.accepted_applications,
        dashboard.members_count
    );

    let listing = app.applications.list_applications(
        ApplicationFilters {
            status: Some(ApplicationStatus::Accepted),
            ..ApplicationFilters::default()
        },
        ApplicationScope::Company(company.id),
        1,
    )?;
    for summary in &listing.data {
        println!(
            "  - {} {} -> {} ({})",
            summary.talent_first_name,
            summary.talent_last_name,
            summary.job_title,
            summary.application.status
        );
    }
    if json {
        match serde_json::to_string_pretty(&listing) {
            Ok(payload) => println!("  Listing payload:\n{payload}"),
            Err(err) => println!("  Listing payload unavailable: {err}"),
        }
    }

    Ok(())
}

fn verified_account(
    app: &DemoApp,
    first_name: &str,
    last_name: &str,
    email: &str,
    role: RoleName,
) -> Result<Actor, ServiceError> {
    let user = app.identity.register(
        Registration {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: "demo-password-2025".to_string(),
        },
        role,
    )?;
    app.identity.verify_email(user.id)?;
    app.identity.actor(user.id)
}

fn build_profile(
    app: &DemoApp,
    talent: &Actor,
    today: NaiveDate,
) -> Result<TalentProfile, ServiceError> {
    let skills = ["Rust", "PostgreSQL"]
        .iter()
        .filter_map(|name| SkillCatalog::standard().by_name(name).map(|skill| skill.id))
        .map(|skill_id| SkillSelection {
            skill_id,
            level: Some(3),
        })
        .collect();
    app.talent.create_profile(
        talent,
        ProfileDraft {
            title: Some("Backend developer".to_string()),
            phone: Some("+221 77 000 00 00".to_string()),
            bio: Some("Five years building payment rails.".to_string()),
            location: Some("Dakar".to_string()),
            skills,
            cv: Some(DocumentUpload::pdf(
                "awa-ndiaye.pdf",
                b"%PDF-1.7 Awa Ndiaye".to_vec(),
            )),
            ..ProfileDraft::default()
        },
    )?;
    let years_ago = |years: i32| {
        NaiveDate::from_ymd_opt(today.year() - years, 9, 1).unwrap_or(today)
    };
    app.talent.add_education(
        talent,
        EducationDraft {
            institution: "Ecole Supérieure Polytechnique".to_string(),
            degree: "Master Informatique".to_string(),
            description: None,
            start_at: years_ago(8),
            end_at: Some(years_ago(6)),
            is_current: false,
        },
    )?;
    app.talent.add_experience(
        talent,
        ExperienceDraft {
            job_title: "Software engineer".to_string(),
            company_name: "Wave".to_string(),
            location: Some("Dakar".to_string()),
            start_at: years_ago(5),
            end_at: None,
            is_current: true,
            description: None,
        },
    )
}

fn describe(gate: &GateDecision) -> String {
    match gate {
        GateDecision::Allow => "allowed".to_string(),
        GateDecision::Deny(reason) => format!("denied ({reason})"),
        GateDecision::Redirect(path) => format!("redirect to {path}"),
    }
}

fn mark(filled: bool) -> &'static str {
    if filled {
        "yes"
    } else {
        "no"
    }
}

fn notification_label(sent: bool) -> &'static str {
    if sent {
        "sent"
    } else {
        "not delivered"
    }
}
