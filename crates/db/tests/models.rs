//! CRUD round-trips against an in-memory SQLite database.

use chrono::{NaiveDate, NaiveTime};
use db::DBService;
use db::models::{
    activity::{Activity, CreateActivity},
    agenda::{AgendaItem, AgendaItemFields},
    preference::{ActivityPreference, PreferenceValues},
    user::User,
};
use uuid::Uuid;

async fn setup() -> DBService {
    DBService::new_in_memory()
        .await
        .expect("in-memory database")
}

async fn create_user(db: &DBService, email: &str) -> User {
    let username = email.split('@').next().unwrap();
    User::create(&db.pool, Uuid::new_v4(), email, Some(username), "$2b$12$hash")
        .await
        .expect("create user")
}

fn fields(activity_id: Uuid) -> AgendaItemFields {
    AgendaItemFields {
        activity_id,
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        notes: Some("llevar agua".to_string()),
        latitude: Some(40.4168),
        longitude: Some(-3.7038),
        recurrence: None,
        reminder_enabled: true,
        reminder_offset_minutes: Some(30),
    }
}

#[tokio::test]
async fn user_round_trip() {
    let db = setup().await;
    let user = create_user(&db, "ana@example.com").await;

    let by_email = User::find_by_email(&db.pool, "ana@example.com")
        .await
        .unwrap()
        .expect("user by email");
    assert_eq!(by_email.id, user.id);
    assert_eq!(by_email.username.as_deref(), Some("ana"));

    assert!(
        User::find_by_email(&db.pool, "nadie@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn duplicate_email_is_a_unique_violation() {
    let db = setup().await;
    create_user(&db, "ana@example.com").await;

    let err = User::create(
        &db.pool,
        Uuid::new_v4(),
        "ana@example.com",
        None,
        "$2b$12$hash",
    )
    .await
    .expect_err("duplicate email must fail");
    assert!(
        err.as_database_error()
            .is_some_and(|e| e.is_unique_violation())
    );
}

#[tokio::test]
async fn standard_activities_are_seeded_and_visible_to_anonymous() {
    let db = setup().await;
    let visible = Activity::find_visible(&db.pool, None).await.unwrap();
    assert!(!visible.is_empty());
    assert!(visible.iter().all(Activity::is_standard));
    assert!(visible.iter().any(|a| a.name == "Senderismo"));
}

#[tokio::test]
async fn own_activities_visible_only_to_owner() {
    let db = setup().await;
    let ana = create_user(&db, "ana@example.com").await;
    let luis = create_user(&db, "luis@example.com").await;

    let data = CreateActivity {
        name: "Escalada".to_string(),
        description: Some("Vía deportiva".to_string()),
        icon_name: Some("terrain".to_string()),
        preferences: None,
    };
    Activity::create(&db.pool, Uuid::new_v4(), Some(ana.id), &data)
        .await
        .unwrap();

    let for_ana = Activity::find_visible(&db.pool, Some(ana.id)).await.unwrap();
    assert!(for_ana.iter().any(|a| a.name == "Escalada"));

    let for_luis = Activity::find_visible(&db.pool, Some(luis.id))
        .await
        .unwrap();
    assert!(!for_luis.iter().any(|a| a.name == "Escalada"));

    let anonymous = Activity::find_visible(&db.pool, None).await.unwrap();
    assert!(!anonymous.iter().any(|a| a.name == "Escalada"));
}

#[tokio::test]
async fn duplicate_activity_name_per_user_rejected() {
    let db = setup().await;
    let ana = create_user(&db, "ana@example.com").await;
    let data = CreateActivity {
        name: "Kayak".to_string(),
        description: None,
        icon_name: None,
        preferences: None,
    };
    Activity::create(&db.pool, Uuid::new_v4(), Some(ana.id), &data)
        .await
        .unwrap();
    let err = Activity::create(&db.pool, Uuid::new_v4(), Some(ana.id), &data)
        .await
        .expect_err("duplicate name for same user must fail");
    assert!(
        err.as_database_error()
            .is_some_and(|e| e.is_unique_violation())
    );
}

#[tokio::test]
async fn preference_upsert_creates_then_merges() {
    let db = setup().await;
    let ana = create_user(&db, "ana@example.com").await;
    let activity = Activity::create(
        &db.pool,
        Uuid::new_v4(),
        Some(ana.id),
        &CreateActivity {
            name: "Remo".to_string(),
            description: None,
            icon_name: None,
            preferences: None,
        },
    )
    .await
    .unwrap();

    let created = ActivityPreference::upsert(
        &db.pool,
        ana.id,
        activity.id,
        &PreferenceValues {
            min_temp: Some(10),
            max_temp: Some(28),
            requires_no_precipitation: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(created.min_temp, Some(10));
    assert!(created.requires_no_precipitation);
    assert!(created.is_active);

    // Partial update: only wind changes, the rest is preserved.
    let updated = ActivityPreference::upsert(
        &db.pool,
        ana.id,
        activity.id,
        &PreferenceValues {
            max_wind_speed: Some(25),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.min_temp, Some(10));
    assert_eq!(updated.max_temp, Some(28));
    assert_eq!(updated.max_wind_speed, Some(25));
    assert!(updated.requires_no_precipitation);

    let all = ActivityPreference::find_by_user(&db.pool, ana.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn agenda_crud_and_join() {
    let db = setup().await;
    let ana = create_user(&db, "ana@example.com").await;
    let activity = Activity::create(
        &db.pool,
        Uuid::new_v4(),
        Some(ana.id),
        &CreateActivity {
            name: "Trail".to_string(),
            description: None,
            icon_name: Some("hiking".to_string()),
            preferences: None,
        },
    )
    .await
    .unwrap();

    let item = AgendaItem::create(&db.pool, Uuid::new_v4(), ana.id, &fields(activity.id))
        .await
        .unwrap();
    assert_eq!(item.reminder_offset_minutes, Some(30));

    let joined = AgendaItem::find_with_activity(&db.pool, item.id)
        .await
        .unwrap()
        .expect("joined item");
    assert_eq!(joined.activity.name, "Trail");
    assert_eq!(joined.activity.icon_name.as_deref(), Some("hiking"));
    assert_eq!(joined.start_time, item.start_time);

    let listed = AgendaItem::find_from_date(
        &db.pool,
        ana.id,
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(listed.len(), 1);

    // Items before the cutoff are excluded.
    let later = AgendaItem::find_from_date(
        &db.pool,
        ana.id,
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
    )
    .await
    .unwrap();
    assert!(later.is_empty());

    let mut updated_fields = fields(activity.id);
    updated_fields.notes = None;
    updated_fields.reminder_enabled = false;
    updated_fields.reminder_offset_minutes = None;
    let updated = AgendaItem::update(&db.pool, item.id, &updated_fields)
        .await
        .unwrap();
    assert!(updated.notes.is_none());
    assert!(!updated.reminder_enabled);

    let deleted = AgendaItem::delete(&db.pool, item.id).await.unwrap();
    assert_eq!(deleted, 1);
    assert!(
        AgendaItem::find_by_id(&db.pool, item.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn upcoming_is_ordered_and_limited() {
    let db = setup().await;
    let ana = create_user(&db, "ana@example.com").await;
    let activity = Activity::create(
        &db.pool,
        Uuid::new_v4(),
        Some(ana.id),
        &CreateActivity {
            name: "Paseo".to_string(),
            description: None,
            icon_name: None,
            preferences: None,
        },
    )
    .await
    .unwrap();

    for day in 1..=5 {
        let mut f = fields(activity.id);
        f.date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        AgendaItem::create(&db.pool, Uuid::new_v4(), ana.id, &f)
            .await
            .unwrap();
    }

    let upcoming = AgendaItem::find_upcoming(
        &db.pool,
        ana.id,
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        3,
    )
    .await
    .unwrap();
    assert_eq!(upcoming.len(), 3);
    assert!(upcoming.windows(2).all(|w| w[0].date <= w[1].date));
}
