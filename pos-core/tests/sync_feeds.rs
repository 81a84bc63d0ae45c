// pos-core/tests/sync_feeds.rs
// 快照同步: 整体替换、错误保留、取消订阅、读写窗口

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pos_core::{
    FeedKind, FeedObserver, MemorySaleStore, MemoryTableStore, SaleStore, StoreError,
    SyncReconciler, TableStore,
};
use rust_decimal::dec;
use shared::models::{NewSale, Order, OrderLine, Table, TablePatch};

#[derive(Default)]
struct CountingObserver {
    errors: Mutex<Vec<FeedKind>>,
    closed: Mutex<Vec<FeedKind>>,
}

impl FeedObserver for CountingObserver {
    fn on_error(&self, feed: FeedKind, _error: &StoreError) {
        self.errors.lock().push(feed);
    }

    fn on_closed(&self, feed: FeedKind) {
        self.closed.lock().push(feed);
    }
}

fn soup_order() -> Order {
    Order::from_lines(vec![OrderLine {
        id: "soup".into(),
        name: "Soup".into(),
        price: dec!(6.50),
        quantity: 1,
    }])
}

fn new_sale(checkout_id: &str) -> NewSale {
    NewSale {
        checkout_id: checkout_id.into(),
        table_id: 1,
        items: soup_order(),
        total: dec!(6.50),
        created_by: None,
    }
}

#[test]
fn test_snapshot_b_replaces_snapshot_a_exactly() {
    let sync = SyncReconciler::new();
    let a = vec![Table::closed(1), Table::closed(2), Table::closed(3)];
    let b = vec![Table::with_order(3, soup_order()), Table::closed(2)];

    sync.apply_tables_snapshot(a);
    sync.apply_tables_snapshot(b);

    let local = sync.tables();
    assert_eq!(
        local,
        vec![Table::closed(2), Table::with_order(3, soup_order())]
    );
}

#[tokio::test]
async fn test_feed_error_keeps_last_good_snapshot() {
    let store = Arc::new(MemoryTableStore::new());
    store.upsert_merge(1, TablePatch::seed()).await.unwrap();

    let observer = Arc::new(CountingObserver::default());
    let sync = Arc::new(SyncReconciler::with_observer(observer.clone()));
    let sub = sync.subscribe_tables(store.as_ref());
    sync.wait_for_tables(1).await;

    store.push_error(StoreError::unavailable("network down"));
    tokio::time::timeout(Duration::from_secs(1), async {
        while !sync.is_stale(FeedKind::Tables) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    assert_eq!(sync.tables().len(), 1);
    assert_eq!(observer.errors.lock().as_slice(), &[FeedKind::Tables]);
    assert!(sub.is_active());
    sub.unsubscribe().await;
}

#[tokio::test]
async fn test_unsubscribed_feed_never_mutates_local_state() {
    let tables = Arc::new(MemoryTableStore::new());
    let sales = Arc::new(MemorySaleStore::new());
    let sync = Arc::new(SyncReconciler::new());

    let table_sub = sync.subscribe_tables(tables.as_ref());
    let sale_sub = sync.subscribe_sales(sales.as_ref());
    sync.wait_for_tables(1).await;
    sync.wait_for_sales(1).await;

    table_sub.unsubscribe().await;
    sale_sub.unsubscribe().await;

    tables.upsert_merge(1, TablePatch::seed()).await.unwrap();
    sales.append(new_sale("co-1")).await.unwrap();
    tables.redeliver();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(sync.tables().is_empty());
    assert!(sync.sales().is_empty());
    assert_eq!(sync.tables_revision(), 1);
    assert_eq!(sync.sales_revision(), 1);
}

#[tokio::test]
async fn test_stale_read_window_until_echo() {
    let store = Arc::new(MemoryTableStore::new());
    let sync = Arc::new(SyncReconciler::new());
    let sub = sync.subscribe_tables(store.as_ref());
    sync.wait_for_tables(1).await;

    store.hold_feed();
    store
        .replace(Table::with_order(6, soup_order()))
        .await
        .unwrap();

    // Write accepted remotely, local view still pre-write
    assert!(store.get(6).is_some());
    assert!(sync.table(6).is_none());

    store.release_feed();
    sync.wait_for_tables(2).await;
    assert_eq!(sync.table(6).map(|t| t.total), Some(dec!(6.50)));
    sub.unsubscribe().await;
}

#[tokio::test]
async fn test_sales_feed_delivers_appends_in_order() {
    let store = Arc::new(MemorySaleStore::new());
    let sync = Arc::new(SyncReconciler::new());
    let sub = sync.subscribe_sales(store.as_ref());

    let first = store.append(new_sale("co-1")).await.unwrap().id;
    let second = store.append(new_sale("co-2")).await.unwrap().id;
    store.append(new_sale("co-1")).await.unwrap();
    sync.wait_for_sales(3).await;

    let ids: Vec<_> = sync.sales().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![first, second]);
    sub.unsubscribe().await;
}

#[tokio::test]
async fn test_dropped_subscription_prunes_store_subscriber() {
    let store = Arc::new(MemoryTableStore::new());
    let observer = Arc::new(CountingObserver::default());
    let sync = Arc::new(SyncReconciler::with_observer(observer.clone()));

    let sub = sync.subscribe_tables(store.as_ref());
    sync.wait_for_tables(1).await;
    assert_eq!(store.subscriber_count(), 1);
    sub.unsubscribe().await;

    store.upsert_merge(1, TablePatch::seed()).await.unwrap();
    assert_eq!(store.subscriber_count(), 0);
    assert!(observer.closed.lock().is_empty());
}
