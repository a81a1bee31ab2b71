//! Order Pipeline
//!
//! Prices an order, checks stock and computes a shipping quote, then
//! combines them into an invoice.
//!
//! Key concepts:
//! - Named gates, with the last one as the machine result
//! - Independent steps that become eligible as their inputs resolve
//! - Predicate guards alongside gate guards
//! - Bounded-concurrency mapping over an array gate
//!
//! Run with: cargo run --example order_pipeline

use flowgate::{flow, when, Definition, FlowError, MachineBuilder};

#[derive(Clone, Debug)]
struct Line {
    sku: String,
    quantity: u32,
    unit_cents: u64,
}

#[derive(Clone, Debug)]
struct Invoice {
    subtotal_cents: u64,
    shipping_cents: u64,
    express: bool,
}

impl Invoice {
    fn total_cents(&self) -> u64 {
        self.subtotal_cents + self.shipping_cents
    }
}

fn in_stock(sku: &str) -> Result<bool, String> {
    match sku {
        "widget" | "gizmo" => Ok(true),
        "doohickey" => Ok(false),
        other => Err(format!("unknown sku {other}")),
    }
}

fn pipeline(lines: Vec<Line>, express: bool) -> Definition {
    Definition::new(
        ["lines", "stock", "subtotal", "shipping", "invoice"],
        move |gates| {
            let order = gates.gate::<Vec<Line>>("lines")?;
            let stock = gates.gate::<Vec<bool>>("stock")?;
            let subtotal = gates.gate::<u64>("subtotal")?;
            let shipping = gates.gate::<u64>("shipping")?;
            let invoice = gates.resolver::<Invoice>()?;

            let load = order.clone();
            let check = order.clone();
            let stock_sink = stock.clone();
            let price = order.clone();
            let subtotal_sink = subtotal.clone();
            let shipping_sink = shipping.clone();
            let stock_ok = stock.clone();

            Ok(vec![
                flow![=> move || load.set(lines)],
                flow![&order => move || {
                    check.array().map(
                        2,
                        |line: Line, done| done(in_stock(&line.sku).map_err(Into::into)),
                        move |result| stock_sink.resolve(result),
                    )
                }],
                flow![&order => move || -> Result<(), FlowError> {
                    let cents = price
                        .get()?
                        .iter()
                        .map(|line| u64::from(line.quantity) * line.unit_cents)
                        .sum();
                    subtotal_sink.set(cents);
                    Ok(())
                }],
                flow![&subtotal, when(move || express) => move || shipping_sink.set(1_500)],
                flow![&subtotal, when(move || !express) => {
                    let subtotal = subtotal.clone();
                    let shipping = shipping.clone();
                    move || -> Result<(), FlowError> {
                        shipping.set(if subtotal.get()? >= 5_000 { 0 } else { 500 });
                        Ok(())
                    }
                }],
                flow![&stock, &subtotal, &shipping => move || -> Result<(), FlowError> {
                    if stock_ok.get()?.contains(&false) {
                        invoice.fail("some lines are out of stock");
                        return Ok(());
                    }
                    invoice.set(Invoice {
                        subtotal_cents: subtotal.get()?,
                        shipping_cents: shipping.get()?,
                        express,
                    });
                    Ok(())
                }],
            ])
        },
    )
}

fn place(label: &str, lines: Vec<Line>, express: bool) {
    let name = label.to_string();
    let result = MachineBuilder::new()
        .label(label)
        .on_complete(move |result: Result<Invoice, FlowError>| match result {
            Ok(invoice) => println!(
                "  {name}: total {} cents (subtotal {}, shipping {}, express {})",
                invoice.total_cents(),
                invoice.subtotal_cents,
                invoice.shipping_cents,
                invoice.express
            ),
            Err(err) => println!("  {name}: rejected: {err}"),
        })
        .start(pipeline(lines, express));

    if let Err(err) = result {
        println!("  {label}: invalid definition: {err}");
    }
}

fn line(sku: &str, quantity: u32, unit_cents: u64) -> Line {
    Line {
        sku: sku.to_string(),
        quantity,
        unit_cents,
    }
}

fn main() {
    println!("Order Pipeline Example");
    println!("======================\n");

    println!("Standard shipping:");
    place(
        "order-1",
        vec![line("widget", 2, 1_250), line("gizmo", 1, 900)],
        false,
    );

    println!("\nFree shipping over 50.00:");
    place("order-2", vec![line("widget", 5, 1_250)], false);

    println!("\nExpress shipping:");
    place("order-3", vec![line("gizmo", 1, 900)], true);

    println!("\nOut of stock:");
    place(
        "order-4",
        vec![line("widget", 1, 1_250), line("doohickey", 1, 300)],
        false,
    );

    println!("\nUnknown item:");
    place("order-5", vec![line("sprocket", 1, 100)], false);
}
