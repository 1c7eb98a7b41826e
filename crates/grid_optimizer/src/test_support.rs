use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::{Coord, Footprint};
use crate::instance::Instance;

/// Random instance on a surface of at most 6x6 with 1 to 4 aligned
/// footprints. Interior lines are kept with probability 2/3.
pub(crate) fn random_instance(seed: u64) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    let maxx: Coord = rng.gen_range(2..=6);
    let maxy: Coord = rng.gen_range(2..=6);
    let h_lines = random_lines(&mut rng, maxy);
    let v_lines = random_lines(&mut rng, maxx);

    let count = rng.gen_range(1..=4);
    let footprints: Vec<Footprint> = (0..count)
        .map(|_| {
            let (x1, x2) = random_interval(&mut rng, &v_lines);
            let (y1, y2) = random_interval(&mut rng, &h_lines);
            Footprint::new(x1, y1, x2, y2)
        })
        .collect();

    Instance::new(maxx, maxy, &h_lines, &v_lines, &footprints)
        .expect("generated instance is well formed")
}

fn random_lines(rng: &mut StdRng, max: Coord) -> Vec<Coord> {
    let mut lines = vec![0];
    lines.extend((1..max).filter(|_| rng.gen_bool(2.0 / 3.0)));
    lines.push(max);
    lines
}

/// Two distinct lines, lower first; narrow intervals are more likely
fn random_interval(rng: &mut StdRng, lines: &[Coord]) -> (Coord, Coord) {
    let lo = rng.gen_range(0..lines.len() - 1);
    let hi = rng.gen_range(lo + 1..=(lo + 2).min(lines.len() - 1));
    (lines[lo], lines[hi])
}

#[test]
fn test_random_instances_are_reproducible() {
    assert_eq!(random_instance(7), random_instance(7));
    for seed in 0..100 {
        let inst = random_instance(seed);
        assert!(inst.maxx() <= 6 && inst.maxy() <= 6);
        assert!(!inst.footprints().is_empty());
        assert!(inst.footprints().iter().all(|fp| fp.x1 < fp.x2 && fp.y1 < fp.y2));
    }
}
