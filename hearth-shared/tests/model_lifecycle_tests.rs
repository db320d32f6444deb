//! Integration tests for record lifecycles across modules
//!
//! Each test walks a record through the operations a Hearth server would
//! apply to it and checks the invariants hold at every step.

use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use hearth_shared::config::ModelConfig;
use hearth_shared::envelope::{ApiResponse, QStashApiResponse, TaskResponse, TasksResponse};
use hearth_shared::models::account::{Account, AccountTypeName, CreateAccount};
use hearth_shared::models::blog::{BlogPost, BlogStatus, CreateBlogPost};
use hearth_shared::models::counter::CounterData;
use hearth_shared::models::guestbook::{GuestbookEntry, NewGuestbookEntry};
use hearth_shared::models::invite::{AccountInvite, InviteStatus};
use hearth_shared::models::membership::{
    ensure_unique_memberships, AccountMember, AccountMemberRole, CreateAccountMember,
};
use hearth_shared::models::note::{CreateNote, CreateNoteType, Note, NoteType, UpdateNote};
use hearth_shared::models::task::{
    QStashTask, TaskScheduleRequest, TaskStatistics, TaskStatus, TaskType,
};
use hearth_shared::models::user::{CreateUser, User, UserRole};
use hearth_shared::ModelError;

fn create_user(username: &str) -> User {
    User::new(CreateUser {
        email: format!("{}@example.com", username),
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        role: UserRole::User,
        preferences: None,
    })
    .unwrap()
}

fn round_trip<T: Serialize + DeserializeOwned>(value: &T) -> T {
    let json = serde_json::to_string(value).unwrap();
    serde_json::from_str(&json).unwrap()
}

fn create_family_account(owner: &User) -> Account {
    Account::new(
        &owner.id,
        CreateAccount {
            name: "The Lovelaces".to_string(),
            account_type: AccountTypeName::Family,
            description: String::new(),
            settings: None,
        },
    )
    .unwrap()
}

fn owner_membership(owner: &User, account: &Account) -> AccountMember {
    AccountMember::new(CreateAccountMember {
        user_id: owner.id.clone(),
        account_id: account.id.clone(),
        role: AccountMemberRole::Owner,
        invited_by: owner.id.clone(),
    })
}

#[test]
fn test_invite_accept_adds_member() {
    let config = ModelConfig::default();
    let owner = create_user("owner");
    let guest = create_user("guest");
    let account = create_family_account(&owner);

    let mut members = vec![owner_membership(&owner, &account)];

    let mut invite =
        AccountInvite::for_account(&account, &guest.email, None, &owner.id, &config).unwrap();
    assert_eq!(invite.status, InviteStatus::Pending);
    assert_eq!(invite.role, AccountMemberRole::Viewer);
    assert_eq!(invite.expires_at - invite.created_at, Duration::days(7));

    account.can_accept_member(members.len() as u32).unwrap();
    let member = invite.accept(&guest.id, Utc::now()).unwrap();
    assert_eq!(invite.status, InviteStatus::Accepted);
    assert_eq!(member.account_id, account.id);
    assert_eq!(member.invited_by, owner.id);

    members.push(member.with_details(&guest));
    ensure_unique_memberships(&members).unwrap();

    // Accepting again is a rejected transition, not a second membership
    let err = invite.accept(&guest.id, Utc::now()).unwrap_err();
    assert_eq!(err.code(), "invalid_transition");
}

#[test]
fn test_terminal_invites_never_expire() {
    let config = ModelConfig::default();
    let owner = create_user("owner");
    let account = create_family_account(&owner);

    let mut declined =
        AccountInvite::for_account(&account, "a@example.com", None, &owner.id, &config).unwrap();
    declined.decline(Utc::now()).unwrap();

    let far_future = Utc::now() + Duration::days(365);
    assert_eq!(declined.effective_status(far_future), InviteStatus::Declined);
    assert!(!declined.expire_if_due(far_future));
    assert_eq!(declined.status, InviteStatus::Declined);
}

#[test]
fn test_late_answer_expires_invite() {
    let config = ModelConfig::default();
    let owner = create_user("owner");
    let account = create_family_account(&owner);

    let mut invite =
        AccountInvite::for_account(&account, "late@example.com", None, &owner.id, &config)
            .unwrap();
    let later = invite.expires_at + Duration::seconds(1);

    assert!(matches!(
        invite.accept("someone", later),
        Err(ModelError::InviteExpired(_))
    ));
    assert_eq!(invite.status, InviteStatus::Expired);
}

#[test]
fn test_personal_account_rejects_invites_and_members() {
    let config = ModelConfig::default();
    let owner = create_user("solo");
    let account = Account::new(
        &owner.id,
        CreateAccount {
            name: "Solo".to_string(),
            account_type: AccountTypeName::Personal,
            description: String::new(),
            settings: None,
        },
    )
    .unwrap();

    assert!(matches!(
        AccountInvite::for_account(&account, "x@example.com", None, &owner.id, &config),
        Err(ModelError::InvitesDisabled(_))
    ));
    assert!(matches!(
        account.can_accept_member(1),
        Err(ModelError::MemberLimitReached { max_members: 1, .. })
    ));
}

#[test]
fn test_duplicate_membership_detected() {
    let owner = create_user("owner");
    let account = create_family_account(&owner);

    let members = vec![
        owner_membership(&owner, &account),
        owner_membership(&owner, &account),
    ];

    assert!(matches!(
        ensure_unique_memberships(&members),
        Err(ModelError::DuplicateMembership { .. })
    ));
}

#[test]
fn test_note_edit_archive_delete() {
    let author = create_user("author");
    let editor = create_user("editor");

    let mut note = Note::new(
        &author.id,
        CreateNote {
            title: "Groceries".to_string(),
            note_type_id: "list".to_string(),
            tags: Some(vec!["Home".to_string(), "home".to_string()]),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(note.tags, Some(vec!["home".to_string()]));

    note.apply_update(
        &editor.id,
        UpdateNote {
            content: Some("milk, eggs".to_string()),
            tags: Some(None),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(note.updated_by.as_deref(), Some(editor.id.as_str()));
    assert_eq!(note.tags, None);

    note.archive(&author.id).unwrap();
    note.unarchive(&author.id).unwrap();
    note.mark_deleted(&author.id).unwrap();

    assert!(note.is_deleted());
    assert!(note.archive(&author.id).is_err());
    assert!(note.apply_update(&editor.id, UpdateNote::default()).is_err());
}

#[test]
fn test_blog_schedule_then_publish() {
    let now = Utc::now();
    let mut post = BlogPost::new(CreateBlogPost {
        title: "Hello, World!".to_string(),
        slug: None,
        author: Some("Ada".to_string()),
        author_id: None,
        account_id: None,
        summary: "First post".to_string(),
        content: "# Hello".to_string(),
        tags: None,
        image_url: None,
        is_public: true,
    })
    .unwrap();
    assert_eq!(post.slug, "hello-world");
    assert_eq!(post.status, BlogStatus::Draft);
    assert!(!post.is_visible(now));

    let at = now + Duration::hours(1);
    post.schedule(at, now).unwrap();
    post.check_invariants().unwrap();
    assert!(!post.is_due(now));
    assert!(post.is_due(at));

    post.publish(at).unwrap();
    post.check_invariants().unwrap();
    assert_eq!(post.scheduled_for, None);
    assert!(post.is_visible(at));

    assert!(post.schedule(at + Duration::hours(1), at).is_err());
}

#[test]
fn test_task_lifecycle_and_statistics() {
    let user = create_user("worker");
    let config = ModelConfig::default();

    let request: TaskScheduleRequest = serde_json::from_value(json!({
        "type": "welcome_email",
        "payload": {"userId": user.id}
    }))
    .unwrap();

    let mut ok_task = QStashTask::from_request(&user.id, request.clone()).unwrap();
    let mut bad_task = QStashTask::from_request(&user.id, request).unwrap();
    let idle_task = QStashTask::from_request(
        &user.id,
        TaskScheduleRequest {
            task_type: TaskType::CleanupTask,
            payload: json!({}),
            scheduled_for: Some(Utc::now() + Duration::days(1)),
        },
    )
    .unwrap();
    assert!(!idle_task.is_due(Utc::now()));

    let now = Utc::now();
    ok_task.attach_message_id("msg_1");
    ok_task.start(now).unwrap();
    ok_task.complete(json!({"sent": true}), now).unwrap();
    ok_task.check_invariants().unwrap();

    bad_task.start(now).unwrap();
    bad_task.fail("smtp timeout", now).unwrap();
    bad_task.check_invariants().unwrap();
    assert!(bad_task.can_retry(config.max_task_retries));

    let tasks = vec![ok_task, bad_task, idle_task];
    let stats = TaskStatistics::from_tasks(&tasks);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.count(TaskStatus::Completed), 1);
    assert_eq!(stats.count(TaskStatus::Failed), 1);
    assert_eq!(stats.count(TaskStatus::Pending), 1);
    assert!(stats.is_consistent());

    let response = TasksResponse::ok(tasks);
    assert!(response.is_well_formed());
    assert_eq!(response.statistics, Some(stats));
}

#[test]
fn test_task_retries_exhaust() {
    let mut task = QStashTask::from_request(
        "u1",
        TaskScheduleRequest {
            task_type: TaskType::Notification,
            payload: json!({"message": "hi"}),
            scheduled_for: None,
        },
    )
    .unwrap();

    let max_retries = 2;
    for _ in 0..max_retries {
        let now = Utc::now();
        task.start(now).unwrap();
        task.fail("unreachable", now).unwrap();
        task.retry(max_retries, now).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        task.check_invariants().unwrap();
    }

    let now = Utc::now();
    task.start(now).unwrap();
    task.fail("unreachable", now).unwrap();
    assert_eq!(task.retry_count, max_retries);
    assert!(matches!(
        task.retry(max_retries, now),
        Err(ModelError::RetriesExhausted { .. })
    ));
}

#[test]
fn test_records_survive_json_round_trip() {
    let owner = create_user("owner");
    let account = create_family_account(&owner).with_viewer_context(Some(AccountMemberRole::Owner));
    let member = owner_membership(&owner, &account).with_details(&owner);
    let invite = AccountInvite::for_account(
        &account,
        "b@example.com",
        Some(AccountMemberRole::Editor),
        &owner.id,
        &ModelConfig::default(),
    )
    .unwrap();
    let task = QStashTask::from_request(
        &owner.id,
        TaskScheduleRequest {
            task_type: TaskType::ScheduledBlogPost,
            payload: json!({"postId": "p1"}),
            scheduled_for: Some(Utc::now()),
        },
    )
    .unwrap();

    let back: User = serde_json::from_str(&serde_json::to_string(&owner).unwrap()).unwrap();
    assert_eq!(back, owner);

    let back: Account = serde_json::from_str(&serde_json::to_string(&account).unwrap()).unwrap();
    assert_eq!(back, account);

    let back: AccountMember =
        serde_json::from_str(&serde_json::to_string(&member).unwrap()).unwrap();
    assert_eq!(back, member);

    let back: AccountInvite =
        serde_json::from_str(&serde_json::to_string(&invite).unwrap()).unwrap();
    assert_eq!(back, invite);

    let response = TaskResponse::ok(task);
    let back: TaskResponse =
        serde_json::from_str(&serde_json::to_string(&response).unwrap()).unwrap();
    assert_eq!(back, response);
}

#[test]
fn test_model_error_in_envelope() {
    let owner = create_user("owner");
    let account = create_family_account(&owner);

    let result: Result<(), ModelError> = account.can_accept_member(6);
    let response: ApiResponse<()> = result.into();

    assert!(!response.success);
    assert!(response.check_invariants().is_ok());
    assert!(response.error.unwrap().contains("is full"));
}

#[test]
fn test_content_records_survive_json_round_trip() {
    let author = create_user("author");

    let mut note = Note::new(
        &author.id,
        CreateNote {
            title: "Recipes".to_string(),
            note_type_id: "list".to_string(),
            category: Some("kitchen".to_string()),
            tags: Some(vec!["food".to_string()]),
            ..Default::default()
        },
    )
    .unwrap();
    note.archive(&author.id).unwrap();
    note.mark_deleted(&author.id).unwrap();
    assert!(note.created_by.is_some() && note.archived_by.is_some() && note.deleted_by.is_some());
    assert_eq!(round_trip(&note), note);

    let note_type = NoteType::new(
        &author.id,
        CreateNoteType {
            name: "Recipe".to_string(),
            color: "#FFAA00".to_string(),
            icon: "utensils".to_string(),
            description: Some("Things to cook".to_string()),
            account_id: None,
        },
    )
    .unwrap();
    assert_eq!(round_trip(&note_type), note_type);

    let system_type = NoteType::system("general", "General", "#336699", "note");
    assert_eq!(round_trip(&system_type), system_type);

    let now = Utc::now();
    let mut post = BlogPost::new(CreateBlogPost {
        title: "Coming soon".to_string(),
        slug: None,
        author: None,
        author_id: Some(author.id.clone()),
        account_id: None,
        summary: String::new(),
        content: "Soon.".to_string(),
        tags: Some(vec!["news".to_string()]),
        image_url: Some("https://example.com/cover.png".to_string()),
        is_public: true,
    })
    .unwrap();
    post.schedule(now + Duration::days(1), now).unwrap();
    assert!(post.scheduled_for.is_some());
    let back = round_trip(&post);
    assert_eq!(back, post);
    back.check_invariants().unwrap();

    let entry = GuestbookEntry::new(NewGuestbookEntry {
        name: "Visitor".to_string(),
        message: "Lovely site".to_string(),
    })
    .unwrap();
    assert_eq!(round_trip(&entry), entry);

    let counter = CounterData::new(42);
    assert_eq!(round_trip(&counter), counter);
}

#[test]
fn test_task_records_survive_json_round_trip() {
    let now = Utc::now();
    let mut done = QStashTask::from_request(
        "u1",
        TaskScheduleRequest {
            task_type: TaskType::WelcomeEmail,
            payload: json!({"email": "ada@example.com"}),
            scheduled_for: None,
        },
    )
    .unwrap();
    done.attach_message_id("msg_42");
    done.start(now).unwrap();
    done.complete(json!({"sent": true, "provider": "smtp"}), now).unwrap();
    assert!(done.result.is_some());
    assert_eq!(round_trip(&done), done);

    let pending = QStashTask::from_request(
        "u1",
        TaskScheduleRequest {
            task_type: TaskType::CleanupTask,
            payload: json!({}),
            scheduled_for: Some(now + Duration::hours(2)),
        },
    )
    .unwrap();

    let listing = TasksResponse::ok(vec![done.clone(), pending]);
    let stats = listing.statistics.unwrap();
    assert_eq!(round_trip(&stats), stats);
    let back = round_trip(&listing);
    assert_eq!(back, listing);
    assert!(back.is_well_formed());

    let envelope = QStashApiResponse::ok(done);
    assert_eq!(round_trip(&envelope), envelope);

    let failure: QStashApiResponse<QStashTask> = QStashApiResponse::err("queue unavailable");
    assert_eq!(round_trip(&failure), failure);
}
