use super::report::TickReport;
use crate::shared::usecase::{execute, UseCase};
use guild_reminder_domain::{
    key_by_community, weekday_name, DueEvent, EventDefinition, ReminderWindow, WebhookMessage,
};
use guild_reminder_infra::{IStoreConnection, ReminderContext, StoreError};
use tracing::{info, warn};

/// Reminds every guild of the events that start within the configured
/// number of minutes
#[derive(Debug)]
pub struct SendEventRemindersUseCase {}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError(StoreError),
}

impl From<StoreError> for UseCaseError {
    fn from(e: StoreError) -> Self {
        Self::StorageError(e)
    }
}

#[async_trait::async_trait]
impl UseCase for SendEventRemindersUseCase {
    type Response = TickReport;

    type Errors = UseCaseError;

    const NAME: &'static str = "SendEventReminders";

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let mut conn = ctx.store.acquire().await?;
        let res = remind_guilds(conn.as_mut(), ctx).await;
        conn.release().await;
        res
    }
}

async fn remind_guilds(
    conn: &mut dyn IStoreConnection,
    ctx: &ReminderContext,
) -> Result<TickReport, UseCaseError> {
    let targets = key_by_community(conn.find_all_targets().await?);
    let events = conn.find_all_events().await?;

    let now = ctx.sys.now().with_timezone(&ctx.config.timezone);
    let window = ReminderWindow::new(now, ctx.config.remind_minutes_before_start);

    let mut report = TickReport::new(now);
    let due_events = find_due_events(events, &window, &mut report);

    if due_events.is_empty() {
        info!("No upcoming events to remind.");
        return Ok(report);
    }
    info!("Found {} upcoming event(s)", due_events.len());

    for due in &due_events {
        let event = &due.event;
        info!(
            "Event ID: {}, Name: {}, Day: {}, Time: {}, Description: {}",
            event.event_id,
            event.name,
            weekday_name(event.weekday),
            event.time_of_day,
            event.description
        );

        for target in &targets {
            let message = WebhookMessage::reminder(due, target, ctx.config.message_format);
            let res = ctx.notifier.send(&target.endpoint, &message).await;
            match &res {
                Ok(_) => info!(
                    "Successfully sent reminder for event '{}' to guild '{}'",
                    event.name, target.community_name
                ),
                Err(e) => warn!(
                    "Failed to send reminder for event '{}' to guild '{}': {}",
                    event.name, target.community_name, e
                ),
            }
            report.record_delivery(due, target, &res);
        }
    }

    Ok(report)
}

/// Keeps the events whose next occurrence lies within `window`.
/// Events that can not be scheduled are recorded in `report` and skipped.
pub fn find_due_events(
    events: Vec<EventDefinition>,
    window: &ReminderWindow,
    report: &mut TickReport,
) -> Vec<DueEvent> {
    report.events_considered = events.len();

    let mut due_events = Vec::new();
    for event in events {
        match event.next_occurrence(&window.now) {
            Ok(occurrence) if window.contains(&occurrence) => {
                due_events.push(DueEvent { event, occurrence })
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Skipping event {}: {}", event.event_id, e);
                report.record_invalid_event(event.event_id, &e);
            }
        }
    }

    report.events_due = due_events.len();
    due_events
}

/// Runs a single reminder tick. Never fails, problems are part of the report.
pub async fn run_tick(ctx: &ReminderContext) -> TickReport {
    let started = ctx.sys.get_timestamp_millis();

    let report = match execute(SendEventRemindersUseCase {}, ctx).await {
        Ok(report) => report,
        Err(UseCaseError::StorageError(e)) => {
            let now = ctx.sys.now().with_timezone(&ctx.config.timezone);
            TickReport::aborted(now, e.to_string())
        }
    };

    info!(
        events_considered = report.events_considered,
        events_due = report.events_due,
        notifications_attempted = report.notifications_attempted,
        notifications_succeeded = report.notifications_succeeded,
        notifications_failed = report.notifications_failed,
        aborted = report.is_aborted(),
        "Reminder tick finished in {} ms",
        ctx.sys.get_timestamp_millis() - started
    );
    for failure in &report.failures {
        warn!("Reminder tick failure: {}", failure);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::report::TickFailure;
    use chrono::{DateTime, TimeZone, Utc};
    use guild_reminder_domain::{MessageFormat, NotificationTarget};
    use guild_reminder_infra::{
        Config, InMemoryStore, RecordingNotifier, StaticTimeSys, StoreConfig,
    };
    use std::sync::Arc;

    fn config() -> Config {
        Config {
            store: StoreConfig {
                host: "127.0.0.1".into(),
                port: 3306,
                database: "pwm".into(),
                user: "reminder".into(),
                password: "secret".into(),
            },
            remind_minutes_before_start: 30,
            timezone: chrono_tz::UTC,
            trigger_times: Vec::new(),
            message_format: MessageFormat::Embed,
            run_on_startup: false,
        }
    }

    struct TestContext {
        ctx: ReminderContext,
        store: Arc<InMemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    // 2024-01-01 is a Monday
    fn monday_at_16() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap()
    }

    fn setup() -> TestContext {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = ReminderContext::create_inmemory(
            config(),
            store.clone(),
            notifier.clone(),
            Arc::new(StaticTimeSys(monday_at_16())),
        );
        TestContext {
            ctx,
            store,
            notifier,
        }
    }

    fn event(event_id: i64, weekday: i64, time_of_day: &str) -> EventDefinition {
        EventDefinition {
            event_id,
            name: format!("Event {}", event_id),
            weekday,
            time_of_day: time_of_day.into(),
            description: "Be there".into(),
        }
    }

    fn window() -> ReminderWindow {
        ReminderWindow::new(monday_at_16().with_timezone(&chrono_tz::UTC), 30)
    }

    #[test]
    fn it_filters_due_events() {
        let events = vec![
            event(1, 1, "16:15"),
            event(2, 1, "16:31"),
            event(3, 1, "15:59"),
            event(4, 2, "16:15"),
            event(5, 1, "16:30"),
        ];
        let mut report = TickReport::new(window().now);
        let due = find_due_events(events, &window(), &mut report);

        let due_ids = due.iter().map(|d| d.event.event_id).collect::<Vec<_>>();
        assert_eq!(due_ids, vec![1, 5]);
        assert_eq!(report.events_considered, 5);
        assert_eq!(report.events_due, 2);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn malformed_events_are_skipped_and_recorded() {
        let events = vec![event(1, 9, "16:15"), event(2, 1, "16:xx"), event(3, 1, "16:15")];
        let mut report = TickReport::new(window().now);
        let due = find_due_events(events, &window(), &mut report);

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].event.event_id, 3);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(
            report.failures[0],
            TickFailure::InvalidEvent { event_id: 1, .. }
        ));
        assert!(matches!(
            report.failures[1],
            TickFailure::InvalidEvent { event_id: 2, .. }
        ));
    }

    #[tokio::test]
    async fn events_without_day_or_time_do_not_abort_tick() {
        let test = setup();
        // How rows with a NULL day or time are loaded
        test.store.insert_event(&event(1, 0, "21:00"));
        test.store.insert_event(&event(2, 1, ""));
        test.store.insert_event(&event(3, 1, "16:15"));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://a.example.com", None));

        let report = run_tick(&test.ctx).await;

        assert!(!report.is_aborted());
        assert_eq!(report.events_considered, 3);
        assert_eq!(report.events_due, 1);
        assert_eq!(report.notifications_succeeded, 1);
        assert_eq!(test.notifier.sent().len(), 1);
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn due_event_is_sent_to_every_target() {
        let test = setup();
        test.store.insert_event(&event(1, 1, "16:15"));
        test.store.insert_event(&event(2, 3, "16:15"));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://a.example.com", None));
        test.store
            .insert_target(&NotificationTarget::new("beta", "https://b.example.com", Some("5")));

        let report = run_tick(&test.ctx).await;

        assert_eq!(report.events_considered, 2);
        assert_eq!(report.events_due, 1);
        assert_eq!(report.notifications_attempted, 2);
        assert_eq!(report.notifications_succeeded, 2);
        assert_eq!(report.notifications_failed, 0);

        let sent = test.notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "https://a.example.com");
        assert_eq!(sent[0].1.content, "@everyone Event 1 - Be there");
        assert_eq!(sent[1].0, "https://b.example.com");
        assert_eq!(sent[1].1.content, "<@&5> @everyone Event 1 - Be there");
        assert_eq!(sent[1].1.embeds[0].timestamp, "2024-01-01T16:15:00+00:00");
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_other_targets() {
        let test = setup();
        test.store.insert_event(&event(1, 1, "16:15"));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://a.example.com", None));
        test.store
            .insert_target(&NotificationTarget::new("beta", "https://b.example.com", None));
        test.notifier.fail_endpoint("https://a.example.com");

        let report = run_tick(&test.ctx).await;

        assert_eq!(test.notifier.sent().len(), 2);
        assert_eq!(report.notifications_attempted, 2);
        assert_eq!(report.notifications_succeeded, 1);
        assert_eq!(report.notifications_failed, 1);
        assert!(matches!(
            &report.failures[0],
            TickFailure::Delivery { community_name, .. } if community_name == "alpha"
        ));
    }

    #[tokio::test]
    async fn unreachable_store_aborts_tick() {
        let test = setup();
        test.store.insert_event(&event(1, 1, "16:15"));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://a.example.com", None));
        test.store.set_unreachable(true);

        let report = run_tick(&test.ctx).await;

        assert!(report.is_aborted());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.notifications_attempted, 0);
        assert!(test.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn failing_query_aborts_tick_and_releases_connection() {
        let test = setup();
        test.store.insert_event(&event(1, 1, "16:15"));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://a.example.com", None));
        test.store.set_failing_queries(true);

        let report = run_tick(&test.ctx).await;

        assert!(report.is_aborted());
        assert!(test.notifier.sent().is_empty());
        assert_eq!(test.store.acquired_count(), 1);
        assert_eq!(test.store.released_count(), 1);
    }

    #[tokio::test]
    async fn connection_is_released_after_tick() {
        let test = setup();
        test.store.insert_event(&event(1, 1, "16:15"));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://a.example.com", None));

        run_tick(&test.ctx).await;
        run_tick(&test.ctx).await;

        assert_eq!(test.store.acquired_count(), 2);
        assert_eq!(test.store.released_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_guild_names_are_reminded_once() {
        let test = setup();
        test.store.insert_event(&event(1, 1, "16:15"));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://old.example.com", None));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://new.example.com", None));

        let report = run_tick(&test.ctx).await;

        assert_eq!(report.notifications_attempted, 1);
        assert_eq!(test.notifier.sent()[0].0, "https://new.example.com");
    }

    #[tokio::test]
    async fn nothing_is_sent_without_due_events() {
        let test = setup();
        test.store.insert_event(&event(1, 2, "16:15"));
        test.store
            .insert_target(&NotificationTarget::new("alpha", "https://a.example.com", None));

        let report = run_tick(&test.ctx).await;

        assert_eq!(report.events_considered, 1);
        assert_eq!(report.events_due, 0);
        assert_eq!(report.notifications_attempted, 0);
        assert!(!report.is_aborted());
        assert!(test.notifier.sent().is_empty());
    }
}
