//! CLI interface for the Milvus helper

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use milvus_helper::client::{DEFAULT_DIM, DEFAULT_NLIST, DEFAULT_TOP_K};
use milvus_helper::vector::parse_metadata_pair;
use milvus_helper::{
    logging, ConnectionConfig, IndexType, InsertOptions, Metadata, MilvusClient, Vector,
};

#[derive(Parser)]
#[command(name = "milvus-helper")]
#[command(about = "Manage Milvus collections and run vector searches", long_about = None)]
struct Cli {
    /// Milvus host (defaults to MILVUS_HOST or localhost)
    #[arg(long)]
    host: Option<String>,

    /// Milvus port (defaults to MILVUS_PORT or 19530)
    #[arg(long)]
    port: Option<u16>,

    /// Connection alias used in logs
    #[arg(long)]
    alias: Option<String>,

    /// Bearer token, either an API key or "user:password"
    #[arg(long)]
    token: Option<String>,

    /// Database name
    #[arg(long)]
    db_name: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List collection names
    List,
    /// Create a collection (no-op if it exists)
    Create {
        name: String,
        /// Vector dimension
        #[arg(long, default_value_t = DEFAULT_DIM)]
        dim: u32,
    },
    /// Drop a collection
    Drop { name: String },
    /// Build an index on the vector field
    Index {
        name: String,
        /// Index algorithm (FLAT, IVF_FLAT, IVF_SQ8, IVF_PQ, HNSW, AUTOINDEX)
        #[arg(long, default_value = "IVF_FLAT")]
        index_type: IndexType,
        #[arg(long, default_value_t = DEFAULT_NLIST)]
        nlist: u32,
    },
    /// Insert one or more vectors
    Insert {
        name: String,
        /// Vector data as comma-separated values (e.g., "1.0,2.0,3.0"); repeatable
        #[arg(short, long = "vector", required = true)]
        vectors: Vec<Vector>,
        /// Metadata applied to every inserted vector, as key=value; repeatable
        #[arg(short, long = "meta")]
        meta: Vec<String>,
        /// Skip the flush after insert
        #[arg(long)]
        no_flush: bool,
        /// Skip loading the collection after insert
        #[arg(long)]
        no_load: bool,
    },
    /// Search for the nearest vectors
    Search {
        name: String,
        /// Query vector as comma-separated values
        query: Vector,
        /// Number of results to return
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
        /// Field to return with each hit; repeatable
        #[arg(long = "output-field")]
        output_fields: Vec<String>,
        /// Boolean filter expression, e.g. 'source == "unit"'
        #[arg(long)]
        filter: Option<String>,
    },
    /// Count rows in a collection
    Count { name: String },
    /// Print a collection's schema as JSON
    Schema { name: String },
}

impl Cli {
    fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::from_env();
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref alias) = self.alias {
            config.alias = alias.clone();
        }
        if let Some(ref token) = self.token {
            config.token = Some(token.clone());
        }
        if let Some(ref db_name) = self.db_name {
            config.db_name = db_name.clone();
        }
        config
    }
}

async fn run(client: &MilvusClient, command: Commands) -> Result<()> {
    match command {
        Commands::List => {
            let names = client.list_collections().await;
            if names.is_empty() {
                println!("No collections");
            } else {
                println!("Collections ({} total):", names.len());
                for name in names {
                    println!("  - {}", name);
                }
            }
        }
        Commands::Create { name, dim } => {
            client.create_collection(&name, dim).await?;
            println!("Collection '{}' ready (dim={})", name, dim);
        }
        Commands::Drop { name } => {
            if !client.delete_collection(&name).await {
                anyhow::bail!("Could not drop collection '{}'", name);
            }
            println!("Dropped collection '{}'", name);
        }
        Commands::Index {
            name,
            index_type,
            nlist,
        } => {
            if !client.create_index(&name, index_type, nlist).await {
                anyhow::bail!("No index created for '{}'", name);
            }
            println!("Created {} index on '{}'", index_type, name);
        }
        Commands::Insert {
            name,
            vectors,
            meta,
            no_flush,
            no_load,
        } => {
            let mut template = Metadata::new();
            for pair in &meta {
                let (key, value) = parse_metadata_pair(pair)?;
                template.insert(key, value);
            }
            let metadata = (!template.is_empty()).then(|| vec![template; vectors.len()]);
            let options = InsertOptions {
                auto_flush: !no_flush,
                auto_load: !no_load,
            };

            let ids = client
                .insert_vectors(&name, vectors, metadata, options)
                .await
                .with_context(|| format!("Insert into '{}' failed", name))?;
            println!("Inserted {} vectors:", ids.len());
            for id in ids {
                println!("  - {}", id);
            }
        }
        Commands::Search {
            name,
            query,
            k,
            output_fields,
            filter,
        } => {
            let hits = client
                .search_vectors(&name, &query, k, &output_fields, filter.as_deref())
                .await;
            if hits.is_empty() {
                println!("No results found");
            } else {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            }
        }
        Commands::Count { name } => {
            let count = client
                .count_entities(&name)
                .await
                .with_context(|| format!("Could not count entities in '{}'", name))?;
            println!("{}", count);
        }
        Commands::Schema { name } => {
            let schema = client
                .get_collection_schema(&name)
                .await
                .with_context(|| format!("Could not describe '{}'", name))?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let client = MilvusClient::connect(cli.connection_config()).await?;
    let result = run(&client, cli.command).await;
    client.disconnect();
    result
}
