use clap::Args;
use rust_decimal::Decimal;
use storefront_app::{
    database::{self, Db},
    domain::products::{
        PgProductsService, ProductsService,
        data::NewProduct,
        records::{ProductStatus, ProductUuid},
    },
};

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    sku: String,

    #[arg(long)]
    name: String,

    /// Unit price in major currency units, e.g. `12.50`
    #[arg(long)]
    price: Decimal,

    /// Units on hand
    #[arg(long, default_value_t = 0)]
    stock: i32,

    /// One of `active`, `inactive` or `discontinued`
    #[arg(long, default_value = "active")]
    status: ProductStatus,
}

pub(crate) async fn run(args: CreateProductArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgProductsService::new(Db::new(pool));

    let product = service
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            sku: args.sku,
            name: args.name,
            price: args.price,
            stock: args.stock,
            status: args.status,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("product_sku: {}", product.sku);
    println!("product_price: {}", product.price);
    println!("product_stock: {}", product.stock);

    Ok(())
}
