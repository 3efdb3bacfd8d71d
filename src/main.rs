#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    phone_scrub_lib::run().await
}
