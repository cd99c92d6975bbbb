//! # Example: Multiply
//!
//! A one-shot node with two inputs. Two producer threads deliver the operands in
//! whatever order the scheduler picks; the node fires once both are present.
//!
//! ## Run
//! ```bash
//! cargo run --example multiply
//! ```

use std::thread;

use pinflow::{NodeBuilder, ResultError, ThreadExecutor};

fn main() -> Result<(), ResultError> {
    let mut b = NodeBuilder::new("multiply").with_executor(ThreadExecutor::new("multiply"));
    let a = b.input::<f64>().expect("pin a");
    let c = b.input::<f64>().expect("pin c");
    let node = b.task(move |f| {
        let (x, y) = (f.take(a)?, f.take(c)?);
        println!("[{}] firing #{}: {x} * {y}", f.node_name(), f.number());
        Ok(x * y)
    });
    node.start();

    let producers = [(node.port(a), 3.0), (node.port(c), 4.0)]
        .into_iter()
        .map(|(port, v)| thread::spawn(move || port.post(v)))
        .collect::<Vec<_>>();
    for p in producers {
        p.join().expect("producer panicked").expect("post rejected");
    }

    let product = node.get()?;
    println!("result: {product}");
    Ok(())
}
