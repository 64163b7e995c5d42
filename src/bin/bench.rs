use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail};
use byteorder::{BigEndian, ByteOrder};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use blight::{SeqId, Store, StoreOptions, WriteMode};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Bench {
  #[arg(short, long, default_value_t = Op::Set)]
  op: Op,
  #[arg(short, long, default_value_t = KeyMode::Seq)]
  key_mode: KeyMode,
  /// Commit writes through the engine's batch instead of one update per write
  #[arg(short, long)]
  batch: bool,
  #[arg(short, long, default_value_t = 1000)]
  count: u64,
  #[arg(short = 's', long, default_value_t = 8)]
  key_size: usize,
  #[arg(short, long, default_value_t = 32)]
  value_size: usize,
  #[arg(short, long, default_value_t = 30)]
  iter_workers: usize,
  #[arg(short, long)]
  mem_backend: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Op {
  /// Raw set
  Set,
  /// JSON encoded set
  SetJson,
  /// Append with generated sequence keys
  Append,
}

impl Display for Op {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let str = match self {
      Op::Set => "set",
      Op::SetJson => "set-json",
      Op::Append => "append",
    };
    f.write_str(str)
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum KeyMode {
  /// Sequential keys
  Seq,
  /// Random keys
  Rnd,
}

impl Display for KeyMode {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let str = match self {
      KeyMode::Seq => "seq",
      KeyMode::Rnd => "rnd",
    };
    f.write_str(str)
  }
}

#[derive(Serialize, Deserialize)]
struct Payload {
  id: u64,
  data: String,
}

#[derive(Debug, Copy, Clone, Default)]
struct BenchResults {
  ops: u64,
  duration: Duration,
}

impl BenchResults {
  fn op_duration(&self) -> Duration {
    if self.ops == 0 {
      Duration::from_secs(0)
    } else {
      Duration::from_secs_f64(self.duration.as_secs_f64() / self.ops as f64)
    }
  }

  fn ops_per_second(&self) -> u64 {
    let op = self.op_duration();
    if op.is_zero() {
      0
    } else {
      (1.0f64 / op.as_secs_f64()) as u64
    }
  }
}

impl Display for BenchResults {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_fmt(format_args!(
      "{:?}\t({:?}/op)\t({} op/sec)",
      self.duration,
      self.op_duration(),
      self.ops_per_second()
    ))
  }
}

static BENCH_BUCKET_NAME: &str = "bench";

fn main() -> anyhow::Result<()> {
  let bench = Bench::parse();
  if bench.op == Op::Append && bench.key_mode == KeyMode::Rnd {
    bail!("append generates its own keys; use --key-mode seq");
  }
  if bench.key_size < 4 {
    bail!("key size must be at least 4 bytes");
  }

  let options = StoreOptions::builder()
    .write_mode(if bench.batch {
      WriteMode::Batch
    } else {
      WriteMode::Update
    })
    .iter_workers(bench.iter_workers)
    .build();
  let (_tmp_file, store) = if bench.mem_backend {
    (None, options.open_mem()?)
  } else {
    let tmp_file = Builder::new()
      .prefix("blight-")
      .suffix(".db")
      .tempfile()?;
    let path = tmp_file.path().to_path_buf();
    (Some(tmp_file), options.open(path)?)
  };

  let mut rng = StdRng::from_entropy();
  let start = Instant::now();
  let mut keys = run_writes(&store, &bench, &mut rng)?;
  let write_results = BenchResults {
    ops: bench.count,
    duration: start.elapsed(),
  };
  keys.shuffle(&mut rng);

  let read_results = run_reads_random(&store, &keys)?;
  let iter_results = run_reads_sequential(&store, &bench)?;
  let concurrent_results = run_reads_concurrent(&store, &bench)?;
  store.close();

  println!("# Write ({}, {})\t{}", bench.op, bench.key_mode, write_results);
  println!("# Get\t{}", read_results);
  println!("# AllFunc\t{}", iter_results);
  println!("# AllFuncConcurrent\t{}", concurrent_results);
  Ok(())
}

fn run_writes(store: &Store, options: &Bench, rng: &mut StdRng) -> blight::Result<Vec<Vec<u8>>> {
  let mut keys = Vec::with_capacity(options.count as usize);
  let value = vec![0u8; options.value_size];
  let data = "x".repeat(options.value_size);
  for i in 0..options.count {
    match options.op {
      Op::Append => {
        let id = store.append(BENCH_BUCKET_NAME, &value)?;
        keys.push(id.to_key().to_vec());
      }
      Op::Set | Op::SetJson => {
        let mut key = vec![0u8; options.key_size];
        let k = match options.key_mode {
          KeyMode::Seq => i as u32,
          KeyMode::Rnd => rng.next_u32(),
        };
        BigEndian::write_u32(&mut key, k);
        if options.op == Op::Set {
          store.set(BENCH_BUCKET_NAME, &key, &value)?;
        } else {
          let payload = Payload {
            id: i,
            data: data.clone(),
          };
          store.set_json(BENCH_BUCKET_NAME, &key, &payload)?;
        }
        keys.push(key);
      }
    }
  }
  Ok(keys)
}

fn run_reads_random(store: &Store, keys: &[Vec<u8>]) -> anyhow::Result<BenchResults> {
  let start = Instant::now();
  for key in keys {
    store
      .get(BENCH_BUCKET_NAME, key)?
      .ok_or_else(|| anyhow!("missing value for key {:?}", key))?;
  }
  Ok(BenchResults {
    ops: keys.len() as u64,
    duration: start.elapsed(),
  })
}

fn run_reads_sequential(store: &Store, options: &Bench) -> anyhow::Result<BenchResults> {
  let start = Instant::now();
  let mut count = 0u64;
  let mut last = None;
  store.all_func(BENCH_BUCKET_NAME, |k, _| {
    count += 1;
    if options.op == Op::Append {
      last = SeqId::from_key(k);
    }
  })?;
  if options.key_mode == KeyMode::Seq && count != options.count {
    bail!(
      "read seq: iter mismatch: expected {}, got {}",
      options.count,
      count
    );
  }
  if options.op == Op::Append && last != Some(SeqId(options.count)) {
    bail!("read seq: last sequence {:?}, expected {}", last, options.count);
  }
  Ok(BenchResults {
    ops: count,
    duration: start.elapsed(),
  })
}

fn run_reads_concurrent(store: &Store, options: &Bench) -> anyhow::Result<BenchResults> {
  let start = Instant::now();
  let count = AtomicU64::new(0);
  store.all_func_concurrent(BENCH_BUCKET_NAME, |_, _| {
    count.fetch_add(1, Ordering::Relaxed);
  })?;
  let count = count.into_inner();
  if options.key_mode == KeyMode::Seq && count != options.count {
    bail!(
      "read concurrent: iter mismatch: expected {}, got {}",
      options.count,
      count
    );
  }
  Ok(BenchResults {
    ops: count,
    duration: start.elapsed(),
  })
}
