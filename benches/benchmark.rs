use criterion::{Criterion, criterion_group, criterion_main};
use recphylo::recphyloxml::{RecPhyloXmlParser, to_string};

const REGRESSION_FILES: &[(&str, &str)] = &[
    ("sliced_transfers", "tests/fixtures/sliced_transfers.xml"),
    ("speciation_loss", "tests/fixtures/speciation_loss.xml"),
];

fn parse_in_memory(path: &str) {
    let rec_phylo = RecPhyloXmlParser::new().parse_file(path).unwrap();
    assert!(rec_phylo.num_gene_trees() > 0);
}

fn parse_buffered(path: &str) {
    let rec_phylo = RecPhyloXmlParser::new().parse_file_buffered(path).unwrap();
    assert!(rec_phylo.num_gene_trees() > 0);
}

fn recphyloxml_parsing(c: &mut Criterion) {
    for (name, path) in REGRESSION_FILES {
        c.bench_function(&format!("{name}_in_memory"), |b| {
            b.iter(|| parse_in_memory(path));
        });
        c.bench_function(&format!("{name}_buffered"), |b| {
            b.iter(|| parse_buffered(path));
        });
    }
}

fn time_slices(c: &mut Criterion) {
    let (_, path) = REGRESSION_FILES[0];
    let rec_phylo = RecPhyloXmlParser::new().parse_file(path).unwrap();

    c.bench_function("subdivide_contract", |b| {
        b.iter(|| {
            for tree in &rec_phylo.gene_trees {
                let mut tree = tree.clone();
                tree.subdivide().unwrap();
                tree.contract().unwrap();
            }
        });
    });
}

fn recphyloxml_writing(c: &mut Criterion) {
    let (_, path) = REGRESSION_FILES[0];
    let rec_phylo = RecPhyloXmlParser::new().parse_file(path).unwrap();

    c.bench_function("write_string", |b| {
        b.iter(|| to_string(&rec_phylo).unwrap());
    });
}

criterion_group!(regression, recphyloxml_parsing, time_slices);
criterion_group! {
    name = reporting;
    config = Criterion::default().sample_size(10);
    targets = recphyloxml_writing
}
criterion_main!(regression, reporting);
