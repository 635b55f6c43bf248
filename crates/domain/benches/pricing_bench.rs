use common::ProductId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Discount, Money, OrderLine, price_order};

fn make_lines(count: usize) -> Vec<OrderLine> {
    (0..count)
        .map(|i| OrderLine {
            product_id: ProductId::new(),
            title: format!("Product {i}"),
            quantity: (i % 5 + 1) as u32,
            unit_price: Money::from_minor(100 * (i as i64 + 1)),
            variant: None,
        })
        .collect()
}

fn bench_price_small_cart(c: &mut Criterion) {
    let lines = make_lines(3);

    c.bench_function("pricing/small_cart_no_coupon", |b| {
        b.iter(|| price_order(&lines, None, Money::from_minor(100)));
    });
}

fn bench_price_with_percentage(c: &mut Criterion) {
    let lines = make_lines(3);

    c.bench_function("pricing/small_cart_percentage", |b| {
        b.iter(|| price_order(&lines, Some(Discount::Percentage(10)), Money::from_minor(100)));
    });
}

fn bench_price_large_cart(c: &mut Criterion) {
    let lines = make_lines(100);

    c.bench_function("pricing/large_cart", |b| {
        b.iter(|| {
            price_order(
                &lines,
                Some(Discount::Fixed(Money::from_minor(500))),
                Money::from_minor(100),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_price_small_cart,
    bench_price_with_percentage,
    bench_price_large_cart
);
criterion_main!(benches);
