//! Racing submissions for the same talent and offer: the store constraint decides.

mod common {
    use std::sync::Arc;

    use hiretop::company::CompanyDraft;
    use hiretop::config::HiringConfig;
    use hiretop::documents::MemoryBlobStore;
    use hiretop::identity::{Actor, Registration, RoleName};
    use hiretop::notify::MemoryNotifier;
    use hiretop::offers::{JobOffer, OfferDraft};
    use hiretop::store::MemoryStore;
    use hiretop::talent::ProfileDraft;
    use hiretop::HireTop;

    pub type App = HireTop<MemoryStore, MemoryBlobStore, MemoryNotifier>;

    pub fn app() -> (App, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let app = HireTop::new(
            store.clone(),
            Arc::new(MemoryBlobStore::default()),
            Arc::new(MemoryNotifier::default()),
            HiringConfig::default(),
        );
        (app, store)
    }

    fn account(app: &App, email: &str, role: RoleName) -> Actor {
        let user = app
            .identity
            .register(
                Registration {
                    first_name: "Race".to_string(),
                    last_name: "Condition".to_string(),
                    email: email.to_string(),
                    password: "password-123".to_string(),
                },
                role,
            )
            .expect("registered");
        app.identity.actor(user.id).expect("actor")
    }

    pub fn talent(app: &App, email: &str) -> Actor {
        let talent = account(app, email, RoleName::Talent);
        app.talent
            .create_profile(&talent, ProfileDraft::default())
            .expect("profile");
        talent
    }

    pub fn published_offer(app: &App) -> JobOffer {
        let admin = account(app, "admin@race.io", RoleName::CompanyAdmin);
        let company = app
            .companies
            .create_company(
                &admin,
                CompanyDraft {
                    name: "Race Inc".to_string(),
                    country: None,
                    address: None,
                    description: None,
                },
            )
            .expect("company");
        app.offers
            .create(
                &admin,
                company.id,
                OfferDraft {
                    title: "Contended role".to_string(),
                    description: "Everyone wants it.".to_string(),
                    ..OfferDraft::default()
                },
            )
            .expect("offer")
    }
}

use std::sync::Barrier;

use common::*;
use hiretop::applications::ApplyRequest;
use hiretop::ServiceError;

const RACERS: usize = 8;

#[test]
fn exactly_one_of_many_racing_applies_wins() {
    let (app, store) = app();
    let talent = talent(&app, "racer@example.com");
    let offer = published_offer(&app);
    let barrier = Barrier::new(RACERS);

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..RACERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    app.applications
                        .apply(&talent, offer.id, ApplyRequest::default())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect()
    });

    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1);
    for outcome in outcomes.iter().filter(|outcome| outcome.is_err()) {
        match outcome {
            Err(ServiceError::Conflict(message)) => {
                assert_eq!(message, "already applied to this offer")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
    assert_eq!(store.all_applications().len(), 1);
}

#[test]
fn different_talents_do_not_contend() {
    let (app, store) = app();
    let offer = published_offer(&app);
    let talents: Vec<_> = (0..RACERS)
        .map(|n| talent(&app, &format!("talent{n}@example.com")))
        .collect();
    let barrier = Barrier::new(RACERS);

    std::thread::scope(|scope| {
        for talent in &talents {
            let barrier = &barrier;
            let app = &app;
            let offer = &offer;
            scope.spawn(move || {
                barrier.wait();
                app.applications
                    .apply(talent, offer.id, ApplyRequest::default())
                    .expect("independent applications succeed");
            });
        }
    });

    assert_eq!(store.all_applications().len(), RACERS);
}
