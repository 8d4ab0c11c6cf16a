use social_graph_core::{GraphStore, PrefixIndex, UserId};
use std::time::Instant;

/// Interest influencer is quadratic in users; skip it past this size.
const INTEREST_INFLUENCER_LIMIT: u64 = 5_000;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let user_count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50_000);

    if mode == "help" || mode == "--help" {
        println!("Usage: social-graph-bench [mode] [user_count]");
        println!();
        println!("Modes:");
        println!("  all          Run all generators and benchmark each (default)");
        println!("  scalefree    Preferential attachment (a few very popular users)");
        println!("  smallworld   Watts-Strogatz ring lattice + shortcuts");
        println!("  random       Erdos-Renyi uniform random friendships");
        println!("  communities  Dense friend circles joined by a few bridges");
        println!();
        println!("Default user_count: 50000");
        return;
    }

    println!("social-graph-bench");
    println!("==================");
    println!();

    let generators: Vec<(&str, fn(u64) -> GraphStore)> = match mode {
        "scalefree" => vec![("Scale-free (preferential attachment)", gen_scale_free)],
        "smallworld" => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        "random" => vec![("Erdos-Renyi random", gen_random)],
        "communities" => vec![("Communities (circles + bridges)", gen_communities)],
        "all" => vec![
            ("Scale-free (preferential attachment)", gen_scale_free as fn(u64) -> GraphStore),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Erdos-Renyi random", gen_random),
            ("Communities (circles + bridges)", gen_communities),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    for (name, generator) in generators {
        run_benchmark(name, generator, user_count.max(2));
    }
}

fn ms(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}

fn run_benchmark(name: &str, generator: fn(u64) -> GraphStore, user_count: u64) {
    println!("--- {} ---", name);
    println!("Target: {} users", user_count);

    let t = Instant::now();
    let store = generator(user_count);
    println!(
        "Generated in {:.2}s: {} users, {} friendships, ~{:.1}MB",
        t.elapsed().as_secs_f64(),
        store.user_count(),
        store.friendship_count(),
        store.memory_usage() as f64 / 1_048_576.0
    );
    println!();

    let t = Instant::now();
    let snapshot = store.adjacency();
    println!(
        "{:<24} {:>8.1}ms ({} users)",
        "adjacency snapshot",
        ms(t),
        snapshot.user_count()
    );

    let far: UserId = store.next_id() - 1;
    let t = Instant::now();
    let path = social_graph_core::shortest_path(&store, 1, far);
    let elapsed = ms(t);
    match path {
        Some(p) => println!(
            "{:<24} {:>8.1}ms (1 -> {}: {} hops)",
            "shortest path",
            elapsed,
            far,
            p.len() - 1
        ),
        None => println!("{:<24} {:>8.1}ms (1 -> {}: no path)", "shortest path", elapsed, far),
    }

    let t = Instant::now();
    let components = social_graph_core::connected_components(&store);
    let largest = components.iter().map(Vec::len).max().unwrap_or(0);
    println!(
        "{:<24} {:>8.1}ms ({} components, largest {})",
        "connected components",
        ms(t),
        components.len(),
        largest
    );

    let t = Instant::now();
    let influencer = social_graph_core::influencer_by_degree(&store);
    println!(
        "{:<24} {:>8.1}ms (user {:?}, {} friends)",
        "degree influencer",
        ms(t),
        influencer,
        influencer.map_or(0, |id| store.friends(id).len())
    );

    if user_count <= INTEREST_INFLUENCER_LIMIT {
        let t = Instant::now();
        let influencer = social_graph_core::influencer_by_interest_overlap(&store);
        println!("{:<24} {:>8.1}ms (user {:?})", "interest influencer", ms(t), influencer);
    } else {
        println!(
            "{:<24} {:>10} (more than {} users)",
            "interest influencer", "skipped", INTEREST_INFLUENCER_LIMIT
        );
    }

    // A mid-range user usually has friends of friends in every topology
    let probe = (user_count / 2).max(1);
    let t = Instant::now();
    let mutual = social_graph_core::recommend_by_mutual(&store, probe, 10);
    println!(
        "{:<24} {:>8.1}ms ({} for user {})",
        "recommend (mutual)",
        ms(t),
        mutual.len(),
        probe
    );

    let t = Instant::now();
    let weighted = social_graph_core::recommend_weighted(&store, probe, 10);
    println!(
        "{:<24} {:>8.1}ms ({} for user {})",
        "recommend (weighted)",
        ms(t),
        weighted.len(),
        probe
    );

    let t = Instant::now();
    let index = PrefixIndex::from_store(&store);
    println!("{:<24} {:>8.1}ms ({} names)", "prefix index build", ms(t), index.len());

    println!();
    println!("{:>8} {:>10} {:>10}", "prefix", "found", "time");
    println!("{:->8} {:->10} {:->10}", "", "", "");
    for prefix in ["", "a", "ka", "mar", "zo", "user"] {
        let t = Instant::now();
        let found = index.suggest_by_prefix(prefix, 10);
        println!("{:>8} {:>10} {:>8.3}ms", format!("'{}'", prefix), found.len(), ms(t));
    }
    println!();
}

// ---------------------------------------------------------------------------
// Generators: deterministic, single-threaded, roughly O(users + friendships)
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

const FIRST_NAMES: [&str; 12] = [
    "ada", "alan", "kate", "karl", "maria", "mark", "nina", "omar", "sven", "yuki", "zoe", "zain",
];

const INTERESTS: [&str; 10] = [
    "music", "hiking", "chess", "cooking", "rust", "film", "travel", "gaming", "art", "running",
];

/// Populate `user_count` users named `<first><id>` with 0..=3 interests each.
fn populate(store: &mut GraphStore, user_count: u64, rng: &mut FastRng) {
    for i in 0..user_count {
        let first = FIRST_NAMES[rng.next(FIRST_NAMES.len() as u64) as usize];
        let id = store.add_user(format!("{}{}", first, i + 1));
        let n = rng.next(4);
        for _ in 0..n {
            store.add_interest(id, INTERESTS[rng.next(INTERESTS.len() as u64) as usize]);
        }
    }
}

/// Befriend two generated users by zero-based index. Self-loops and repeats are ignored.
fn befriend(store: &mut GraphStore, a: u64, b: u64) {
    if a != b {
        let _ = store.add_friend(a + 1, b + 1);
    }
}

/// Scale-free via endpoint sampling.
///
/// Each new user befriends existing users picked from the list of friendship
/// endpoints, so popular users are proportionally more likely to gain friends.
fn gen_scale_free(user_count: u64) -> GraphStore {
    let per_user = 5u64;
    let mut store = GraphStore::with_capacity(user_count as usize);
    let mut rng = FastRng::new(12345);
    populate(&mut store, user_count, &mut rng);

    let mut endpoints: Vec<u64> = Vec::with_capacity((user_count * per_user * 2) as usize);

    // Seed: small clique
    let seed = 5u64.min(user_count);
    for i in 0..seed {
        for j in (i + 1)..seed {
            befriend(&mut store, i, j);
            endpoints.push(i);
            endpoints.push(j);
        }
    }

    for new_user in seed..user_count {
        for _ in 0..per_user.min(new_user) {
            let target = endpoints[rng.next(endpoints.len() as u64) as usize];
            if target != new_user {
                befriend(&mut store, new_user, target);
                endpoints.push(new_user);
                endpoints.push(target);
            }
        }
    }

    store
}

/// Small-world (Watts-Strogatz): ring lattice + random rewiring.
fn gen_small_world(user_count: u64) -> GraphStore {
    let k = 5u64; // neighbors on each side
    let p = 0.05f64; // rewire probability
    let mut store = GraphStore::with_capacity(user_count as usize);
    let mut rng = FastRng::new(67890);
    populate(&mut store, user_count, &mut rng);

    for i in 0..user_count {
        for j in 1..=k {
            let neighbor = (i + j) % user_count;
            if rng.next_f64() < p {
                let rewired = rng.next(user_count);
                befriend(&mut store, i, if rewired != i { rewired } else { neighbor });
            } else {
                befriend(&mut store, i, neighbor);
            }
        }
    }

    store
}

/// Erdos-Renyi: ~5 uniformly random friendships per user.
fn gen_random(user_count: u64) -> GraphStore {
    let mut store = GraphStore::with_capacity(user_count as usize);
    let mut rng = FastRng::new(54321);
    populate(&mut store, user_count, &mut rng);

    for _ in 0..user_count * 5 {
        let a = rng.next(user_count);
        let b = rng.next(user_count);
        befriend(&mut store, a, b);
    }

    store
}

/// Communities: circles of ~50 users, densely connected inside, with one
/// bridge friendship to the next circle for every other circle. Produces
/// many components and heavy mutual-friend overlap.
fn gen_communities(user_count: u64) -> GraphStore {
    let circle = 50u64.min(user_count);
    let mut store = GraphStore::with_capacity(user_count as usize);
    let mut rng = FastRng::new(99999);
    populate(&mut store, user_count, &mut rng);

    let circles = user_count.div_ceil(circle);
    for c in 0..circles {
        let start = c * circle;
        let size = circle.min(user_count - start);
        for i in 0..size {
            for _ in 0..8u64.min(size - 1) {
                befriend(&mut store, start + i, start + rng.next(size));
            }
        }
        if c % 2 == 0 && c + 1 < circles {
            befriend(&mut store, start + size - 1, start + size);
        }
    }

    store
}
