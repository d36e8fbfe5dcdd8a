//! Static website on S3.

use serde_json::json;

use crate::program::{ProgramContext, Resource};

pub const PROJECT_NAME: &str = "inline_s3_project";

pub const INDEX_CONTENT: &str = r#"<html>
    <head><title>Hello S3</title><meta charset="UTF-8"></head>
    <body>
        <p>Hello, world!</p>
        <p>Made with ❤️ with <a href="https://pulumi.com">Pulumi</a></p>
    </body>
</html>"#;

/// Bucket with website hosting, public ACLs allowed, and an `index.html`
/// uploaded once the bucket accepts public objects.
pub fn declare(ctx: &mut ProgramContext) {
    ctx.set_description("S3 static website");

    let bucket = ctx.resource(Resource::new("s3-website-bucket", "aws:s3:BucketV2"));

    let website = ctx.resource(
        Resource::new("website", "aws:s3:BucketWebsiteConfigurationV2").properties(json!({
            "bucket": bucket.id(),
            "indexDocument": { "suffix": "index.html" },
        })),
    );

    let ownership = ctx.resource(
        Resource::new("ownershipControls", "aws:s3:BucketOwnershipControls").properties(json!({
            "bucket": bucket.id(),
            "rule": { "objectOwnership": "ObjectWriter" },
        })),
    );

    let public_access = ctx.resource(
        Resource::new("publicAccessBlock", "aws:s3:BucketPublicAccessBlock").properties(json!({
            "bucket": bucket.id(),
            "blockPublicAcls": false,
        })),
    );

    ctx.resource(
        Resource::new("index.html", "aws:s3:BucketObject")
            .properties(json!({
                "bucket": bucket.id(),
                "content": INDEX_CONTENT,
                "contentType": "text/html",
                "acl": "public-read",
            }))
            .depends_on([&public_access, &ownership, &website]),
    );

    ctx.export(
        "website_url",
        format!("http://{}", website.attr("websiteEndpoint")),
    );
}
