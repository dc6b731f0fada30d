use opseed_store::parse_snapshot;

fn main() {
    divan::main();
}

/// `n` list entries under one container, three leaves each.
fn synthetic_snapshot(n: usize) -> String {
    let mut xml = String::from("<interfaces xmlns=\"urn:ietf:params:xml:ns:yang:ietf-interfaces\">");
    for i in 0..n {
        xml.push_str(&format!(
            "<interface><name>eth{i}</name><oper-status>up</oper-status><speed>10000</speed></interface>"
        ));
    }
    xml.push_str("</interfaces>");
    xml
}

#[divan::bench(args = [100, 10_000])]
fn parse_interfaces(bencher: divan::Bencher, n: usize) {
    let xml = synthetic_snapshot(n);
    bencher.bench(|| parse_snapshot(divan::black_box(&xml)).unwrap().len());
}
