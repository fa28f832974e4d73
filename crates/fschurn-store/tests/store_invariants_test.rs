//! Store invariants under repeated and concurrent use.

use std::fs;
use std::io::Read;
use std::sync::{Arc, Barrier};
use std::thread;

use fschurn_store::testing::TestStore;
use fschurn_store::{ContentStore, DigestAlgorithm, HashingStream, RandomReader};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_roundtrip_digest_matches_write_time_digest() {
    let env = TestStore::new().unwrap();

    let mut rng = StdRng::seed_from_u64(0xfeed);
    let entry = env
        .store
        .write(0, RandomReader::new(&mut rng), 1_000_003)
        .unwrap();

    // Re-read and re-hash independently of the store
    let mut stream = HashingStream::new(fs::File::open(&entry.path).unwrap(), DigestAlgorithm::Sha256);
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).unwrap();

    assert_eq!(buf.len(), 1_000_003);
    assert_eq!(stream.digest(), entry.digest);
    assert_eq!(entry.path.file_name().unwrap().to_str().unwrap(), entry.digest.to_hex());
}

#[test]
fn test_verify_is_idempotent_and_read_only() {
    let env = TestStore::new().unwrap();
    let entry = env.populate(1, 64 * 1024).unwrap().remove(0);

    let before = fs::read(&entry.path).unwrap();
    let mtime = fs::metadata(&entry.path).unwrap().modified().unwrap();

    for _ in 0..5 {
        let verification = env.store.verify(&entry.path).unwrap();
        assert!(verification.is_intact());
        assert_eq!(verification.actual, entry.digest);
        assert_eq!(verification.bytes, 64 * 1024);
    }

    assert_eq!(fs::read(&entry.path).unwrap(), before);
    assert_eq!(fs::metadata(&entry.path).unwrap().modified().unwrap(), mtime);
}

#[test]
fn test_concurrent_writers_never_share_staging() {
    const WORKERS: usize = 8;
    const WRITES: usize = 5;

    let env = TestStore::new().unwrap();
    let store: Arc<ContentStore> = Arc::new(env.store.clone());
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|idx| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(idx as u64);
                barrier.wait();
                (0..WRITES)
                    .map(|_| store.write(idx, RandomReader::new(&mut rng), 32 * 1024).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut entries = Vec::new();
    for h in handles {
        entries.extend(h.join().unwrap());
    }

    assert_eq!(entries.len(), WORKERS * WRITES);
    assert_eq!(env.entry_paths().unwrap().len(), WORKERS * WRITES);
    assert_eq!(env.staged_files().unwrap(), 0);
    for entry in entries {
        assert!(env.store.verify(&entry.path).unwrap().is_intact());
    }
}
