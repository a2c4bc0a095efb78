use nclist_set::{Interval, IntervalSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Feature {
    name: String,
    chrom: String,
    start: u64,
    stop: u64,
}

impl Feature {
    fn new(name: &str, chrom: &str, start: u64, stop: u64) -> Self {
        Feature {
            name: name.to_owned(),
            chrom: chrom.to_owned(),
            start,
            stop,
        }
    }

    fn interval(&self) -> Interval<String, u64> {
        Interval::new(self.chrom.clone(), self.start, self.stop)
    }
}

fn main() {
    let genes = IntervalSet::build_with(
        [
            Feature::new("BRCA2", "chr13", 32_315_474, 32_400_266),
            Feature::new("RB1", "chr13", 48_303_747, 48_481_890),
            Feature::new("FLT3", "chr13", 28_003_274, 28_100_592),
        ],
        Feature::interval,
    )
    .unwrap();

    let mut exons = IntervalSet::with_projection(Feature::interval);
    exons
        .update([
            Feature::new("BRCA2-e1", "chr13", 32_315_474, 32_315_667),
            Feature::new("BRCA2-e2", "chr13", 32_316_422, 32_316_527),
            Feature::new("RB1-e1", "chr13", 48_303_747, 48_304_049),
        ])
        .unwrap();

    let window = Interval::new("chr13".to_owned(), 32_000_000, 33_000_000);
    for gene in genes.overlapping(&window) {
        println!("{} overlaps {}", gene.name, window);
    }

    let hits = genes.intersection(&exons, true).unwrap();
    for segment in hits.iter() {
        let gene = segment.left.as_ref().map_or("-", |g| g.name.as_str());
        let exon = segment.right.as_ref().map_or("-", |e| e.name.as_str());
        println!("{gene} / {exon}: {}", segment.interval);
    }

    let covered = genes.merge(false);
    let gaps = genes.complement(Some(0), Some(114_364_328)).unwrap();
    println!("{} covered ranges, {} gaps", covered.len(), gaps.len());
}
