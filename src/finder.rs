// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The point finder.
//!
//! The nice thing about the Buddhabrot is that, unlike the Mandelbrot
//! set, there's a very finite universe in which you're allowed to
//! play.  The bad thing is that the universe is *absolute*: you can't
//! zoom in on part of a Buddhabrot without plotting the orbits of
//! every seed that passes through it.  So the expensive part, finding
//! seeds whose orbits are long enough to be worth plotting, is done
//! once, and the seeds are written to a point file for the plotters
//! to reuse.

use errors::{FractalError, Result};
use escape::escape_count;
use generators::{Candidates, PointGenerator};
use num::Complex;
use planes::Area;
use pointfile::PointSink;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// The window of escape counts that makes a seed interesting: long
/// enough to trace a visible path, short of the hard ceiling.  Each
/// candidate is iterated to its own ceiling, drawn from the same
/// window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BailoutRange {
    min: usize,
    max: usize,
}

impl BailoutRange {
    /// Fails if the ends are reversed or the ceiling is zero.
    pub fn new(min: usize, max: usize) -> Result<BailoutRange> {
        if min > max {
            return Err(FractalError::invalid(format!(
                "bailout minimum {} is greater than its maximum {}",
                min, max
            )));
        }
        if max == 0 {
            return Err(FractalError::invalid("bailout maximum must be positive"));
        }
        Ok(BailoutRange { min, max })
    }

    /// The fewest iterations an interesting seed may take to escape.
    pub fn min(&self) -> usize {
        self.min
    }

    /// The hard ceiling: no orbit is iterated further than this.
    pub fn max(&self) -> usize {
        self.max
    }

    /// True if `iterations` lies strictly between the ends.
    pub fn contains(&self, iterations: usize) -> bool {
        iterations > self.min && iterations < self.max
    }

    /// A per-candidate iteration ceiling, uniform over `[min, max]`.
    pub fn draw_ceiling<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        Uniform::new_inclusive(self.min, self.max).sample(rng)
    }
}

/// A shared stop flag.  Whoever holds a clone may cancel; the
/// workers poll it between candidates and never get interrupted
/// mid-evaluation.  The finder itself only ever reads it.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token nobody has cancelled yet.
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    /// Ask every holder to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once anyone has called `cancel`.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a run of the finder did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FinderReport {
    /// Candidates tested.
    pub evaluated: u64,
    /// Candidates accepted and saved.
    pub accepted: usize,
}

/// Draws candidates, keeps the ones whose escape count falls inside
/// the bailout range, and saves them.
#[derive(Clone, Debug)]
pub struct PointFinder {
    viewport: Area,
    bailout: BailoutRange,
    threads: usize,
    limit: Option<usize>,
    seed: Option<u64>,
    randomized: bool,
}

impl PointFinder {
    /// A single-threaded finder that runs until cancelled.
    pub fn new(viewport: Area, bailout: BailoutRange) -> PointFinder {
        PointFinder {
            viewport,
            bailout,
            threads: 1,
            limit: None,
            seed: None,
            randomized: true,
        }
    }

    /// Evaluate candidates on this many workers.
    pub fn with_threads(mut self, threads: usize) -> PointFinder {
        self.threads = threads.max(1);
        self
    }

    /// Stop by ourselves once this many points have been saved.
    pub fn with_limit(mut self, limit: Option<usize>) -> PointFinder {
        self.limit = limit;
        self
    }

    /// Seed the workers' random sources deterministically.  Worker `n`
    /// gets `seed + n`.  Without a seed every worker draws from the
    /// operating system's entropy.
    pub fn with_seed(mut self, seed: Option<u64>) -> PointFinder {
        self.seed = seed;
        self
    }

    /// Iterate every candidate to the hard ceiling instead of drawing
    /// a ceiling per candidate.
    pub fn with_randomized_ceiling(mut self, randomized: bool) -> PointFinder {
        self.randomized = randomized;
        self
    }

    /// The acceptance test under a given ceiling: the seed escapes
    /// within `ceiling` iterations, and the count lies strictly inside
    /// the bailout range.
    pub fn accepts(&self, candidate: Complex<f64>, ceiling: usize) -> bool {
        match escape_count(candidate, ceiling.min(self.bailout.max)) {
            Some(iterations) => self.bailout.contains(iterations),
            None => false,
        }
    }

    /// The acceptance test with a freshly drawn ceiling.
    pub fn is_interesting<R: Rng + ?Sized>(&self, candidate: Complex<f64>, rng: &mut R) -> bool {
        let ceiling = if self.randomized {
            self.bailout.draw_ceiling(rng)
        } else {
            self.bailout.max
        };
        self.accepts(candidate, ceiling)
    }

    fn rng(&self, worker: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker as u64)),
            None => StdRng::from_entropy(),
        }
    }

    /// Search until `cancel` is raised or the limit is reached.  Each
    /// worker builds its own generator with `make_generator` and its
    /// own random source; they share nothing but the sink, the
    /// counters and the token.  The order in which points from
    /// different workers reach the sink is unspecified.  Everything
    /// saved before the stop stays saved.
    pub fn run<S, F>(
        &self,
        make_generator: F,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<FinderReport>
    where
        S: PointSink + Send,
        F: Fn() -> Box<dyn PointGenerator> + Sync,
    {
        info!(
            "searching for points escaping in [{}, {}] on {} workers",
            self.bailout.min, self.bailout.max, self.threads
        );
        if self.bailout.max - self.bailout.min < 2 {
            warn!(
                "no escape count lies strictly between {} and {}; nothing will be accepted",
                self.bailout.min, self.bailout.max
            );
        }
        let shared = Mutex::new(&mut *sink);
        let accepted = AtomicUsize::new(0);
        let evaluated = AtomicU64::new(0);
        let done = AtomicBool::new(false);

        let outcomes = crossbeam::scope(|spawner| {
            let handles: Vec<_> = (0..self.threads)
                .map(|worker| {
                    let (shared, accepted, evaluated, done) =
                        (&shared, &accepted, &evaluated, &done);
                    let make_generator = &make_generator;
                    spawner.spawn(move |_| -> Result<()> {
                        let mut rng = self.rng(worker);
                        let mut ceilings = StdRng::seed_from_u64(rng.gen());
                        let candidates = Candidates::new(make_generator(), &mut rng, self.viewport);
                        for candidate in candidates {
                            if cancel.is_cancelled() || done.load(Ordering::Relaxed) {
                                break;
                            }
                            evaluated.fetch_add(1, Ordering::Relaxed);
                            if !self.is_interesting(candidate, &mut ceilings) {
                                continue;
                            }
                            let saved = self.save(shared, accepted, done, candidate);
                            if saved.is_err() {
                                done.store(true, Ordering::Relaxed);
                            }
                            if let Some(count) = saved? {
                                trace!("accepted {} ({} so far)", candidate, count);
                            }
                        }
                        Ok(())
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(Err(FractalError::WorkerPanicked)))
                .collect::<Vec<Result<()>>>()
        })
        .map_err(|_| FractalError::WorkerPanicked)?;

        let flushed = match shared.into_inner() {
            Ok(sink) => sink.flush().map_err(FractalError::from),
            Err(_) => Err(FractalError::WorkerPanicked),
        };
        for outcome in outcomes {
            outcome?;
        }
        flushed?;

        let report = FinderReport {
            evaluated: evaluated.load(Ordering::Relaxed),
            accepted: accepted.load(Ordering::Relaxed),
        };
        info!(
            "accepted {} of {} candidates",
            report.accepted, report.evaluated
        );
        Ok(report)
    }

    // Save one accepted point unless the limit has already been met,
    // raising `done` when this point meets it.  Returns the running
    // count of saved points when it saves.
    fn save<S: PointSink>(
        &self,
        shared: &Mutex<&mut S>,
        accepted: &AtomicUsize,
        done: &AtomicBool,
        candidate: Complex<f64>,
    ) -> Result<Option<usize>> {
        let mut sink = shared.lock().map_err(|_| FractalError::WorkerPanicked)?;
        let count = accepted.load(Ordering::Relaxed);
        let limit = self.limit.unwrap_or(usize::max_value());
        if count >= limit {
            done.store(true, Ordering::Relaxed);
            return Ok(None);
        }
        sink.save(candidate)?;
        accepted.store(count + 1, Ordering::Relaxed);
        if count + 1 >= limit {
            done.store(true, Ordering::Relaxed);
        }
        Ok(Some(count + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generators::Strategy;
    use pointfile::{PointFiles, PointWriter};
    use rand::RngCore;
    use std::io;
    use tempfile::tempdir;

    // Hands out a fixed list of candidates, then raises the token.
    struct Scripted {
        script: Vec<Complex<f64>>,
        next: usize,
        cancel: CancellationToken,
    }

    impl PointGenerator for Scripted {
        fn next_point(&mut self, _rng: &mut dyn RngCore, _viewport: &Area) -> Complex<f64> {
            if self.next >= self.script.len() {
                self.cancel.cancel();
                return Complex::new(2.0, 0.0);
            }
            self.next += 1;
            self.script[self.next - 1]
        }
    }

    struct BrokenSink;

    impl PointSink for BrokenSink {
        fn save(&mut self, _point: Complex<f64>) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    fn finder(min: usize, max: usize) -> PointFinder {
        PointFinder::new(Area::default(), BailoutRange::new(min, max).unwrap())
    }

    #[test]
    fn bailout_range_must_be_ordered() {
        assert!(BailoutRange::new(10, 5).is_err());
        assert!(BailoutRange::new(0, 0).is_err());
        let range = BailoutRange::new(5, 10).unwrap();
        assert!(range.contains(6) && range.contains(9) && range.contains(7));
        assert!(!range.contains(5) && !range.contains(10));
        assert!(!range.contains(4) && !range.contains(11));
        assert!(!BailoutRange::new(7, 7).unwrap().contains(7));
    }

    #[test]
    fn ceilings_cover_the_whole_range() {
        let range = BailoutRange::new(5, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(29);
        let ceilings: Vec<usize> = (0..600).map(|_| range.draw_ceiling(&mut rng)).collect();
        assert!(ceilings.iter().all(|&ceiling| ceiling >= 5 && ceiling <= 10));
        assert!(ceilings.contains(&5) && ceilings.contains(&10));
        assert_eq!(BailoutRange::new(3, 3).unwrap().draw_ceiling(&mut rng), 3);
    }

    #[test]
    fn endpoint_escape_counts_are_rejected() {
        let finder = finder(5, 10);
        let lower = Complex::new(0.5, 0.0);
        let ceiling = Complex::new(0.3167, 0.0);
        assert_eq!(escape_count(lower, 100), Some(5));
        assert_eq!(escape_count(ceiling, 100), Some(10));
        for max in 5..=10 {
            assert!(!finder.accepts(lower, max));
            assert!(!finder.accepts(ceiling, max));
        }
    }

    #[test]
    fn late_escapes_depend_on_the_drawn_ceiling() {
        let finder = finder(5, 10);
        let late = Complex::new(0.33, 0.0);
        assert_eq!(escape_count(late, 100), Some(9));
        assert!(finder.accepts(late, 9) && finder.accepts(late, 10));
        assert!(!finder.accepts(late, 8) && !finder.accepts(late, 5));

        let mut rng = StdRng::seed_from_u64(23);
        let verdicts: Vec<bool> = (0..200)
            .map(|_| finder.is_interesting(late, &mut rng))
            .collect();
        assert!(verdicts.iter().any(|&accepted| accepted));
        assert!(verdicts.iter().any(|&accepted| !accepted));

        let fixed = finder.with_randomized_ceiling(false);
        assert!((0..50).all(|_| fixed.is_interesting(late, &mut rng)));
    }

    #[test]
    fn only_escape_counts_inside_the_range_are_kept() {
        let cancel = CancellationToken::new();
        let script = vec![
            Complex::new(2.0, 0.0),   // escapes on the 2nd iteration
            Complex::new(-0.75, 0.0), // never escapes
            Complex::new(0.35, 0.0),  // 8th
            Complex::new(1.0, 0.0),   // 3rd
            Complex::new(0.26, 0.0),  // 30th
            Complex::new(0.4, 0.0),   // 7th
            Complex::new(0.5, 0.0),   // 5th
            Complex::new(0.3167, 0.0), // 10th
        ];
        let token = cancel.clone();
        let make = move || -> Box<dyn PointGenerator> {
            Box::new(Scripted {
                script: script.clone(),
                next: 0,
                cancel: token.clone(),
            })
        };
        let mut found: Vec<Complex<f64>> = vec![];
        let report = finder(5, 10)
            .with_randomized_ceiling(false)
            .run(make, &mut found, &cancel)
            .unwrap();
        assert_eq!(found, vec![Complex::new(0.35, 0.0), Complex::new(0.4, 0.0)]);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.evaluated, 8);
    }

    #[test]
    fn limit_stops_every_worker_exactly() {
        let cancel = CancellationToken::new();
        let mut found: Vec<Complex<f64>> = vec![];
        let finder = finder(5, 50)
            .with_threads(4)
            .with_limit(Some(25))
            .with_seed(Some(17));
        let report = finder
            .run(|| Strategy::BulbsExcluded.generator(), &mut found, &cancel)
            .unwrap();
        assert_eq!(found.len(), 25);
        assert_eq!(report.accepted, 25);
        assert!(found.iter().all(|&c| finder.accepts(c, 50)));
    }

    #[test]
    fn limit_leaves_the_callers_token_alone() {
        let cancel = CancellationToken::new();
        let mut found: Vec<Complex<f64>> = vec![];
        finder(5, 50)
            .with_limit(Some(1))
            .with_seed(Some(1))
            .run(|| Strategy::Uniform.generator(), &mut found, &cancel)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn cancelled_token_stops_before_the_first_candidate() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut found: Vec<Complex<f64>> = vec![];
        let report = finder(5, 50)
            .with_threads(3)
            .run(|| Strategy::Uniform.generator(), &mut found, &cancel)
            .unwrap();
        assert_eq!(report, FinderReport::default());
        assert!(found.is_empty());
    }

    #[test]
    fn accepted_points_reach_the_point_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("points");
        let cancel = CancellationToken::new();
        let report = {
            let mut writer = PointWriter::append(&path).unwrap();
            finder(10, 200)
                .with_threads(2)
                .with_limit(Some(40))
                .with_seed(Some(5))
                .run(|| Strategy::EdgeBiased.generator(), &mut writer, &cancel)
                .unwrap()
        };
        let read: Vec<Complex<f64>> = PointFiles::new(vec![path]).collect();
        assert_eq!(read.len(), report.accepted);
        assert_eq!(read.len(), 40);
    }

    #[test]
    fn sink_failure_stops_the_run() {
        let cancel = CancellationToken::new();
        let result = finder(1, 50)
            .with_threads(2)
            .with_seed(Some(3))
            .run(|| Strategy::Uniform.generator(), &mut BrokenSink, &cancel);
        match result {
            Err(FractalError::Io(_)) => {}
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }
}
