use common::{AggregateId, BuyerId, FarmerId, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Actor, Aggregate, ItemStatus, Money, NewLineItem, Order, OrderService, OrderStatus,
    PlaceOrder, UpdateItemStatus,
};
use event_store::InMemoryEventStore;

fn lines(farmers: &[FarmerId]) -> Vec<NewLineItem> {
    farmers
        .iter()
        .map(|farmer| {
            NewLineItem::new(
                ProductId::new(),
                "Produce",
                *farmer,
                2,
                Money::from_minor(250),
            )
        })
        .collect()
}

fn bench_derive_status(c: &mut Criterion) {
    let statuses: Vec<ItemStatus> = (0..64).map(|i| ItemStatus::ALL[i % 5]).collect();

    c.bench_function("domain/derive_order_status_64_items", |b| {
        b.iter(|| OrderStatus::derive(statuses.iter().copied()));
    });
}

fn bench_replay(c: &mut Criterion) {
    let farmer = FarmerId::new();
    let mut order = Order::default();
    let placed = order
        .place(AggregateId::new(), BuyerId::new(), lines(&[farmer; 8]), "Bench Road")
        .unwrap();
    order.apply_events(placed.clone());

    let mut events = placed;
    for item in order.items().to_vec() {
        for target in [ItemStatus::Accepted, ItemStatus::Shipped, ItemStatus::Delivered] {
            let step = order
                .advance_item(item.item_id, target, Actor::Farmer(farmer))
                .unwrap();
            order.apply_events(step.clone());
            events.extend(step);
        }
    }

    c.bench_function("domain/replay_order_25_events", |b| {
        b.iter(|| Order::from_events(events.iter().cloned()));
    });
}

fn bench_place_and_advance(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/place_then_accept", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = OrderService::new(InMemoryEventStore::new());
                let farmer = FarmerId::new();
                let cmd = PlaceOrder::new(BuyerId::new(), lines(&[farmer, farmer]), "Bench Road");
                let placed = service.place_order(cmd).await.unwrap();
                let order_id = placed.aggregate.id().unwrap();
                let item_id = placed.aggregate.items()[0].item_id;
                service
                    .update_item_status(UpdateItemStatus::new(
                        order_id,
                        item_id,
                        ItemStatus::Accepted,
                        Actor::Farmer(farmer),
                    ))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_derive_status, bench_replay, bench_place_and_advance);
criterion_main!(benches);
