use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

use ooktx_rs::reader::DebruijnReader;
use ooktx_rs::sequencer::{DeBruijnSequencer, target_length};
use ooktx_rs::stream::{Reader, bit_at};

fn read_all(sequencer: &mut DeBruijnSequencer) -> Vec<bool> {
    let mut bits = Vec::new();
    while let Some(bit) = sequencer.read_bit() {
        bits.push(bit);
    }
    bits
}

#[test]
fn test_sequencer_windows_appear_once() {
    let mut sequencer = DeBruijnSequencer::new(8);
    for order in 1..=10u8 {
        let length = sequencer.init(order).unwrap();
        assert_eq!(length, target_length(order));

        let bits = read_all(&mut sequencer);
        assert!(sequencer.consumed());
        assert_eq!(bits.len() as u64, length, "order {order}");

        let n = order as usize;
        let windows: HashSet<u32> = bits
            .windows(n)
            .map(|w| w.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32))
            .collect();
        assert_eq!(windows.len(), 1 << n, "order {order}");
        assert_eq!(bits.len() - n + 1, 1 << n, "order {order}");
    }
}

#[test]
fn test_order_two_is_00110() {
    let mut sequencer = DeBruijnSequencer::new(1);
    sequencer.init(2).unwrap();
    assert_eq!(read_all(&mut sequencer), [false, false, true, true, false]);
    assert_eq!(sequencer.read_bit(), None);
}

#[test]
fn test_full_fifo_blocks_producer_without_loss() {
    const CAPACITY: usize = 8;
    let mut sequencer = DeBruijnSequencer::new(CAPACITY);
    sequencer.init(12).unwrap();

    thread::sleep(Duration::from_millis(50));
    assert_eq!(sequencer.buffered(), CAPACITY);

    // Still full: the producer is parked, not dropping
    thread::sleep(Duration::from_millis(20));
    assert_eq!(sequencer.buffered(), CAPACITY);

    let mut bits = vec![sequencer.read_bit().unwrap()];
    let deadline = Instant::now() + Duration::from_secs(2);
    while sequencer.buffered() < CAPACITY {
        assert!(Instant::now() < deadline, "producer did not resume");
        thread::yield_now();
    }

    bits.extend(read_all(&mut sequencer));

    let mut reference = DeBruijnSequencer::new(4096);
    reference.init(12).unwrap();
    assert_eq!(bits, read_all(&mut reference));
}

#[test]
fn test_stop_mid_generation_then_reinit() {
    let mut sequencer = DeBruijnSequencer::new(16);
    sequencer.init(30).unwrap();
    for _ in 0..100 {
        assert!(sequencer.read_bit().is_some());
    }

    let started = Instant::now();
    sequencer.stop();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(sequencer.read_bit(), None);

    sequencer.init(3).unwrap();
    let bits: String = read_all(&mut sequencer)
        .iter()
        .map(|&b| if b { '1' } else { '0' })
        .collect();
    assert_eq!(bits, "0001011100");
}

#[test]
fn test_init_same_order_is_noop() {
    let mut sequencer = DeBruijnSequencer::new(4);
    sequencer.init(5).unwrap();
    let head: Vec<bool> = (0..6).filter_map(|_| sequencer.read_bit()).collect();

    sequencer.init(5).unwrap();
    assert_eq!(sequencer.consumed_length(), 6);

    sequencer.restart().unwrap();
    let again: Vec<bool> = (0..6).filter_map(|_| sequencer.read_bit()).collect();
    assert_eq!(head, again);
}

#[test]
fn test_init_after_full_read_restarts() {
    let mut sequencer = DeBruijnSequencer::new(4);
    sequencer.init(2).unwrap();
    assert_eq!(read_all(&mut sequencer).len(), 5);
    assert!(sequencer.consumed());

    sequencer.init(2).unwrap();
    assert!(!sequencer.consumed());
    let bits: String = read_all(&mut sequencer)
        .iter()
        .map(|&b| if b { '1' } else { '0' })
        .collect();
    assert_eq!(bits, "00110");
}

#[test]
fn test_init_keeps_finished_worker_backlog() {
    // The whole sequence fits in the FIFO, so the worker exits early
    let mut sequencer = DeBruijnSequencer::new(16);
    sequencer.init(3).unwrap();
    let head: Vec<bool> = (0..4).filter_map(|_| sequencer.read_bit()).collect();

    let deadline = Instant::now() + Duration::from_secs(5);
    while sequencer.buffered() < 6 {
        assert!(Instant::now() < deadline, "worker stalled");
        thread::sleep(Duration::from_millis(1));
    }

    sequencer.init(3).unwrap();
    assert_eq!(sequencer.consumed_length(), 4);
    let mut bits = head;
    bits.extend(read_all(&mut sequencer));
    let bits: String = bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
    assert_eq!(bits, "0001011100");
}

#[test]
fn test_try_read_bit_matches_blocking_order() {
    let mut reference = DeBruijnSequencer::new(8);
    reference.init(7).unwrap();
    let expected = read_all(&mut reference);

    let mut sequencer = DeBruijnSequencer::new(8);
    sequencer.init(7).unwrap();
    let mut bits = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !sequencer.consumed() {
        assert!(Instant::now() < deadline, "worker stalled");
        let before = sequencer.consumed_length();
        match sequencer.try_read_bit() {
            Some(bit) => bits.push(bit),
            None => {
                assert_eq!(sequencer.consumed_length(), before);
                thread::yield_now();
            }
        }
    }

    assert_eq!(sequencer.try_read_bit(), None);
    assert_eq!(bits, expected);
}

#[test]
fn test_reader_length_and_reset() {
    let mut sequencer = DeBruijnSequencer::new(8);
    sequencer.init(6).unwrap();
    let mut reader =
        DebruijnReader::new(sequencer, vec![true, false], vec![false, false], false)
            .unwrap();

    let drain = |reader: &mut DebruijnReader| {
        let mut bits = Vec::new();
        let mut buffer = [0u8; 5];
        loop {
            let n = reader.read(&mut buffer, 40).unwrap();
            if n == 0 {
                return bits;
            }
            bits.extend((0..n).map(|i| bit_at(&buffer, i)));
        }
    };

    let first = drain(&mut reader);
    assert_eq!(first.len() as u64, reader.length());
    assert_eq!(reader.length(), target_length(6) * 2);

    reader.reset().unwrap();
    assert_eq!(drain(&mut reader), first);
}
