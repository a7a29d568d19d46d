//! End-to-end engine tests against the scripted stub client.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use sirenwatch_common::{Region, SirenwatchError, Status};
use sirenwatch_scraper::testing::{kyiv_date, text_message, StubTelegramClient};
use sirenwatch_scraper::{Scraper, ScraperOptions};
use sirenwatch_telegram::{Message, Update};

/// Newest-first, as the channel serves it. The 19:46 clear predates the
/// 2024-08-20 horizon and must stop the paging loop.
fn odesa_history() -> Vec<Message> {
    vec![
        text_message(
            2,
            "🔴 02:15 Повітряна тривога в Одеська область\nСлідкуйте за подальшими повідомленнями.\n#Одеська_область",
            kyiv_date("2024-08-21 02:15:19"),
        ),
        text_message(
            1,
            "🟢 19:46 Відбій тривоги в Одеська область.\nСлідкуйте за подальшими повідомленнями.\n#Одеська_область",
            kyiv_date("2024-08-19 19:46:52"),
        ),
    ]
}

/// A single pre-horizon message, for tests that only need the backfill to
/// terminate cleanly.
fn pre_horizon_history() -> Vec<Message> {
    vec![text_message(
        1,
        "🟢 09:58 Відбій тривоги в Одеська область.",
        kyiv_date("2024-08-19 10:00:00"),
    )]
}

fn kyiv_city_live() -> Vec<Update> {
    vec![
        Update::NewMessage(text_message(
            3,
            "🔴 08:39 Повітряна тривога в м. Київ\nСлідкуйте за подальшими повідомленнями.\n#м_Київ",
            kyiv_date("2024-08-22 08:40:01"),
        )),
        Update::NewMessage(text_message(
            4,
            "🟢 10:06 Відбій тривоги в м. Київ.\nСлідкуйте за подальшими повідомленнями.\n#м_Київ",
            kyiv_date("2024-08-22 10:06:43"),
        )),
    ]
}

fn scraper_with(client: StubTelegramClient) -> Arc<Scraper> {
    Arc::new(Scraper::new(
        Arc::new(client),
        ScraperOptions::builder()
            .history_from(kyiv_date("2024-08-20 00:00:00"))
            .build(),
    ))
}

fn spawn_run(
    scraper: &Arc<Scraper>,
    shutdown: &CancellationToken,
) -> tokio::task::JoinHandle<Result<(), SirenwatchError>> {
    let scraper = Arc::clone(scraper);
    let shutdown = shutdown.clone();
    tokio::spawn(async move { scraper.run(shutdown).await })
}

#[tokio::test]
async fn scrapes_history_and_live_updates() {
    let scraper = scraper_with(StubTelegramClient::new(odesa_history(), kyiv_city_live()));
    let mut updates = scraper.update_stream();

    let shutdown = CancellationToken::new();
    let run = spawn_run(&scraper, &shutdown);

    scraper.wait_for_history(&shutdown).await.unwrap();

    // Only the 02:15 raise survives the horizon check.
    let odesa = scraper.alert_data().get(Region::Odesa).unwrap();
    assert_eq!(
        odesa,
        Status {
            region: Region::Odesa,
            enabled: true,
            updated_at: kyiv_date("2024-08-21 02:15:00"),
            is_history: true,
        }
    );

    // The long-running seeds are raised before any message arrives.
    assert_eq!(
        scraper.alert_data().get(Region::Crimea).unwrap(),
        Status {
            region: Region::Crimea,
            enabled: true,
            updated_at: kyiv_date("2022-12-11 00:22:00"),
            is_history: true,
        }
    );
    assert_eq!(
        scraper.alert_data().get(Region::Luhansk).unwrap(),
        Status {
            region: Region::Luhansk,
            enabled: true,
            updated_at: kyiv_date("2022-04-04 19:45:00"),
            is_history: true,
        }
    );

    // Both live updates arrive on the feed, in order.
    let raised = updates.recv().await.unwrap();
    assert_eq!(
        raised,
        Status {
            region: Region::KyivCity,
            enabled: true,
            updated_at: kyiv_date("2024-08-22 08:39:00"),
            is_history: false,
        }
    );
    let cleared = updates.recv().await.unwrap();
    assert_eq!(
        cleared,
        Status {
            region: Region::KyivCity,
            enabled: false,
            updated_at: kyiv_date("2024-08-22 10:06:00"),
            is_history: false,
        }
    );
    assert_eq!(scraper.alert_data().get(Region::KyivCity).unwrap(), cleared);

    // Cancellation is the normal shutdown path...
    shutdown.cancel();
    let outcome = run.await.unwrap();
    assert!(matches!(outcome, Err(SirenwatchError::Cancelled)));

    // ...and closes the feed for good.
    assert!(updates.recv().await.is_none());

    // A second start does not repeat the run.
    scraper.run(CancellationToken::new()).await.unwrap();
}

#[tokio::test]
async fn second_start_returns_immediately_while_the_first_still_runs() {
    let scraper = scraper_with(StubTelegramClient::new(odesa_history(), vec![]));
    let shutdown = CancellationToken::new();
    let run = spawn_run(&scraper, &shutdown);

    // Once the history latch fires, the spawned call owns the run; this
    // call must return at once instead of scraping again.
    scraper.wait_for_history(&shutdown).await.unwrap();
    scraper.run(shutdown.clone()).await.unwrap();

    shutdown.cancel();
    assert!(matches!(
        run.await.unwrap(),
        Err(SirenwatchError::Cancelled)
    ));
}

#[tokio::test]
async fn wait_for_history_honours_cancellation() {
    let scraper = scraper_with(StubTelegramClient::new(vec![], vec![]));
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let err = scraper.wait_for_history(&shutdown).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn backfill_transport_errors_end_the_run() {
    // An empty history script fails the very first page request.
    let scraper = scraper_with(StubTelegramClient::new(vec![], vec![]));

    let err = scraper.run(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, SirenwatchError::Telegram(_)));
}

#[tokio::test]
async fn closed_live_stream_is_a_protocol_violation() {
    let client = StubTelegramClient::new(pre_horizon_history(), vec![]);
    client.close_live();
    let scraper = scraper_with(client);

    let err = scraper.run(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, SirenwatchError::Protocol(_)));
}

#[tokio::test]
async fn slow_consumer_updates_are_discarded_after_the_timeout() {
    let live = vec![
        Update::NewMessage(text_message(
            10,
            "🔴 08:00 Повітряна тривога в Сумська область",
            kyiv_date("2024-08-22 08:00:10"),
        )),
        Update::NewMessage(text_message(
            11,
            "🔴 08:01 Повітряна тривога в Львівська область",
            kyiv_date("2024-08-22 08:01:10"),
        )),
        Update::NewMessage(text_message(
            12,
            "🔴 08:02 Повітряна тривога в Рівненська область",
            kyiv_date("2024-08-22 08:02:10"),
        )),
    ];
    let scraper = Arc::new(Scraper::new(
        Arc::new(StubTelegramClient::new(pre_horizon_history(), live)),
        ScraperOptions::builder()
            .history_from(kyiv_date("2024-08-20 00:00:00"))
            .update_discard_timeout(Duration::from_millis(50))
            .build(),
    ));
    let mut updates = scraper.update_stream();

    let shutdown = CancellationToken::new();
    let run = spawn_run(&scraper, &shutdown);

    // Nobody reads the feed: the first update parks in the buffer, the
    // other two hit the discard timeout. The live path must stay live and
    // keep merging.
    let data = scraper.alert_data();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !data.get(Region::Rivne).unwrap().enabled {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("live updates merged despite the stalled consumer");

    assert!(data.get(Region::Sumy).unwrap().enabled);
    assert!(data.get(Region::Lviv).unwrap().enabled);

    // Let the last send hit its discard timeout before draining the buffer,
    // so the freed slot cannot pick it up.
    tokio::time::sleep(Duration::from_millis(150)).await;

    let first = updates.recv().await.unwrap();
    assert_eq!(first.region, Region::Sumy);

    shutdown.cancel();
    assert!(matches!(
        run.await.unwrap(),
        Err(SirenwatchError::Cancelled)
    ));
    assert!(updates.recv().await.is_none());
}

#[tokio::test]
#[should_panic(expected = "update_stream")]
async fn taking_the_update_stream_twice_panics() {
    let scraper = scraper_with(StubTelegramClient::new(vec![], vec![]));
    let _first = scraper.update_stream();
    let _second = scraper.update_stream();
}
