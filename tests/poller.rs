//! Polling behaviour against a scripted mailbox: attempt cadence, early
//! resolution, and sender filtering. All timing runs on a paused clock.

use mailcode::{
    AuthToken, CodeOutcome, Credentials, Mailbox, MessageSummary, Poller, RetryPolicy, Sender,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

fn summary(id: &str, sender: &str) -> MessageSummary {
    MessageSummary {
        id: id.into(),
        sender: Sender {
            address: sender.into(),
        },
        subject: "Your verification code".into(),
    }
}

/// Mailbox fake that replays one listing per polling attempt.
///
/// Listings are consumed front-to-back; once exhausted, the inbox reads as
/// empty. Bodies are looked up by message id.
struct ScriptedMailbox {
    accept_credentials: bool,
    listings: Mutex<Vec<Vec<MessageSummary>>>,
    bodies: Vec<(String, String)>,
    list_calls: AtomicU32,
    fetched_ids: Mutex<Vec<String>>,
}

impl ScriptedMailbox {
    fn new(listings: Vec<Vec<MessageSummary>>, bodies: Vec<(&str, &str)>) -> Self {
        Self {
            accept_credentials: true,
            listings: Mutex::new(listings),
            bodies: bodies
                .into_iter()
                .map(|(id, body)| (id.to_string(), body.to_string()))
                .collect(),
            list_calls: AtomicU32::new(0),
            fetched_ids: Mutex::new(Vec::new()),
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn fetched_ids(&self) -> Vec<String> {
        self.fetched_ids.lock().unwrap().clone()
    }
}

impl Mailbox for ScriptedMailbox {
    async fn authenticate(&self, _credentials: &Credentials) -> Option<AuthToken> {
        self.accept_credentials.then(|| AuthToken::new("token"))
    }

    async fn list_messages(&self, _token: &AuthToken) -> Vec<MessageSummary> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut listings = self.listings.lock().unwrap();
        if listings.is_empty() {
            Vec::new()
        } else {
            listings.remove(0)
        }
    }

    async fn fetch_body(&self, _token: &AuthToken, message_id: &str) -> String {
        self.fetched_ids.lock().unwrap().push(message_id.to_string());
        self.bodies
            .iter()
            .find(|(id, _)| id == message_id)
            .map(|(_, body)| body.clone())
            .unwrap_or_default()
    }
}

fn poller(mailbox: &ScriptedMailbox, allowed: Vec<String>) -> Poller<&ScriptedMailbox> {
    Poller::with_policy(mailbox, RetryPolicy::new(5, Duration::from_secs(5)), allowed)
}

fn credentials() -> Credentials {
    Credentials::new("box@tohru.org", "mv5a63mn")
}

#[tokio::test(start_paused = true)]
async fn test_empty_inbox_exhausts_all_attempts() {
    let mailbox = ScriptedMailbox::empty();
    let start = Instant::now();

    let outcome = poller(&mailbox, Vec::new()).fetch_code(&credentials()).await;

    assert_eq!(outcome, CodeOutcome::NotFound);
    assert_eq!(mailbox.list_calls(), 5);
    // 5 attempts, sleeps only between them.
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_code_on_third_attempt_stops_early() {
    let mailbox = ScriptedMailbox::new(
        vec![
            Vec::new(),
            Vec::new(),
            vec![summary("m1", "no-reply@shop.example")],
        ],
        vec![("m1", "Hi! Your verification code is 482913.")],
    );
    let start = Instant::now();

    let outcome = poller(&mailbox, Vec::new()).fetch_code(&credentials()).await;

    assert_eq!(outcome, CodeOutcome::Found("482913".into()));
    assert_eq!(mailbox.list_calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_body_without_code_keeps_polling() {
    let mailbox = ScriptedMailbox::new(
        vec![
            vec![summary("m1", "no-reply@shop.example")],
            vec![summary("m2", "no-reply@shop.example")],
        ],
        vec![
            ("m1", "Welcome aboard, no code here."),
            ("m2", "Your code: 271828"),
        ],
    );

    let outcome = poller(&mailbox, Vec::new()).fetch_code(&credentials()).await;

    assert_eq!(outcome, CodeOutcome::Found("271828".into()));
    assert_eq!(mailbox.fetched_ids(), vec!["m1", "m2"]);
}

#[tokio::test(start_paused = true)]
async fn test_allow_list_skips_unknown_newest_sender() {
    let listing = vec![
        summary("spam", "stranger@elsewhere.example"),
        summary("real", "No-Reply@Shop.Example"),
    ];
    let mailbox = ScriptedMailbox::new(
        vec![listing],
        vec![
            ("spam", "lucky number 999999"),
            ("real", "verification code 314159"),
        ],
    );

    let outcome = poller(&mailbox, vec!["no-reply@shop.example".into()])
        .fetch_code(&credentials())
        .await;

    assert_eq!(outcome, CodeOutcome::Found("314159".into()));
    // The stranger's message body must never be fetched.
    assert_eq!(mailbox.fetched_ids(), vec!["real"]);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_case_allow_list_entry_still_matches() {
    let mailbox = ScriptedMailbox::new(
        vec![vec![summary("m1", "no-reply@shop.example")]],
        vec![("m1", "your code is 123456")],
    );

    // Entries are normalized at construction, not just via the config builder.
    let outcome = poller(&mailbox, vec!["No-Reply@Shop.Example".into()])
        .fetch_code(&credentials())
        .await;

    assert_eq!(outcome, CodeOutcome::Found("123456".into()));
}

#[tokio::test(start_paused = true)]
async fn test_allow_list_with_no_match_exhausts() {
    let mailbox = ScriptedMailbox::new(
        vec![vec![summary("spam", "stranger@elsewhere.example")]],
        vec![("spam", "code 123456")],
    );

    let outcome = poller(&mailbox, vec!["no-reply@shop.example".into()])
        .fetch_code(&credentials())
        .await;

    assert_eq!(outcome, CodeOutcome::NotFound);
    assert!(mailbox.fetched_ids().is_empty());
    assert_eq!(mailbox.list_calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credentials_never_poll() {
    let mut mailbox = ScriptedMailbox::empty();
    mailbox.accept_credentials = false;
    let start = Instant::now();

    let outcome = poller(&mailbox, Vec::new()).fetch_code(&credentials()).await;

    assert_eq!(outcome, CodeOutcome::NotFound);
    assert_eq!(mailbox.list_calls(), 0);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_serializes_as_sentinel() {
    let mailbox = ScriptedMailbox::empty();
    let outcome = poller(&mailbox, Vec::new()).fetch_code(&credentials()).await;

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json, serde_json::json!({ "code": "111111" }));
}
