use clap::Args;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;

use crate::app::AppState;
use crate::auth::hash_password;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::{AppConfig, StoreBackend};
use crate::database::models::{NewCategory, NewComment, NewPost, NewUser};

/// Password given to every seeded account
pub const SEED_PASSWORD: &str = "password123";

const FIRST_NAMES: &[&str] = &[
    "alice", "bruno", "chen", "dana", "emeka", "farah", "goran", "hana", "ivan", "julia", "kofi", "lena",
];

const TOPICS: &[&str] = &[
    "Technology", "Travel", "Cooking", "Science", "Music", "Books", "Gardening", "Photography", "Fitness",
    "History",
];

const WORDS: &[&str] = &[
    "quiet", "morning", "river", "engine", "garden", "signal", "paper", "winter", "harbor", "thread", "lantern",
    "orbit", "market", "canvas", "summit", "echo", "meadow", "circuit", "compass", "ember",
];

#[derive(Debug, Args)]
pub struct SeedArgs {
    #[arg(long, default_value_t = 20, help = "Number of users, categories, posts and comments to create")]
    pub count: usize,

    #[arg(long, help = "Seed for the random generator, for reproducible data")]
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub categories: usize,
    pub posts: usize,
    pub comments: usize,
}

fn sentence(rng: &mut StdRng, words: usize) -> String {
    let mut text = (0..words)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(first) = text.get(..1) {
        text = first.to_uppercase() + &text[1..];
    }
    text
}

/// Wipe content and non-superuser accounts, then generate `count` of each
/// entity. Posts pick a random author and category, comments a random post
/// and author.
pub async fn seed(state: &AppState, count: usize, rng: &mut StdRng) -> anyhow::Result<SeedSummary> {
    state.maintenance.clear_content(true).await?;
    let mut summary = SeedSummary::default();
    if count == 0 {
        return Ok(summary);
    }

    let password_hash = hash_password(SEED_PASSWORD)?;

    let mut users = Vec::with_capacity(count);
    for i in 0..count {
        let name = FIRST_NAMES[i % FIRST_NAMES.len()];
        let username = format!("{}{}", name, i + 1);
        let user = state
            .users
            .create_user(NewUser {
                email: format!("{}@example.com", username),
                username,
                password_hash: password_hash.clone(),
                is_superuser: false,
            })
            .await?;
        users.push(user.id);
    }
    summary.users = users.len();

    let mut categories = Vec::with_capacity(count);
    for i in 0..count {
        let topic = TOPICS[i % TOPICS.len()];
        let name = if i < TOPICS.len() {
            topic.to_string()
        } else {
            format!("{} {}", topic, i / TOPICS.len() + 1)
        };
        let category = state.categories.insert(0, NewCategory { name }).await?;
        categories.push(category.id);
    }
    summary.categories = categories.len();

    let mut posts = Vec::with_capacity(count);
    for _ in 0..count {
        let author = users[rng.gen_range(0..users.len())];
        let title_words = rng.gen_range(2..6);
        let draft = NewPost {
            title: sentence(rng, title_words),
            content: (0..rng.gen_range(2..5))
                .map(|_| sentence(rng, 12) + ".")
                .collect::<Vec<_>>()
                .join(" "),
            category: categories[rng.gen_range(0..categories.len())],
            published: rng.gen_bool(0.7),
        };
        let post = state.posts.insert(author, draft).await?;
        posts.push(post.id);
    }
    summary.posts = posts.len();

    for _ in 0..count {
        let author = users[rng.gen_range(0..users.len())];
        let words = rng.gen_range(4..16);
        let draft = NewComment {
            post: posts[rng.gen_range(0..posts.len())],
            content: sentence(rng, words) + ".",
        };
        state.comments.insert(author, draft).await?;
        summary.comments += 1;
    }

    tracing::info!(
        "Seeded {} users, {} categories, {} posts, {} comments",
        summary.users,
        summary.categories,
        summary.posts,
        summary.comments
    );
    Ok(summary)
}

pub async fn handle(args: SeedArgs, config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.database.backend == StoreBackend::Memory {
        tracing::warn!("The in-memory store is discarded when this command exits");
    }

    let state = AppState::from_config(config).await?;
    let mut rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let summary = seed(&state, args.count, &mut rng).await?;

    output_success(
        &output_format,
        &format!(
            "Seeded {} users (password '{}'), {} categories, {} posts, {} comments",
            summary.users, SEED_PASSWORD, summary.categories, summary.posts, summary.comments
        ),
        Some(json!({ "seeded": summary })),
    )
}
