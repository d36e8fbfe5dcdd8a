//! Aurora MySQL cluster in the default VPC.
//!
//! The cluster is publicly reachable so the seeding step can connect from
//! wherever `pilot` runs. Credentials are placeholders.

use serde_json::json;

use crate::program::{Invoke, ProgramContext, Resource};

pub const PROJECT_NAME: &str = "database_migration_project";

pub const ENGINE: &str = "aurora-mysql";
pub const ENGINE_VERSION: &str = "8.0.mysql_aurora.3.08.0";
pub const INSTANCE_CLASS: &str = "db.t3.medium";

pub const DB_NAME: &str = "hellosql";
pub const DB_USER: &str = "hellosql";
pub const DB_PASSWORD: &str = "hellosql";

/// Number of subnets handed to the subnet group.
const SUBNET_COUNT: usize = 2;

pub fn declare(ctx: &mut ProgramContext) {
    ctx.set_description("Aurora MySQL cluster with a public endpoint");

    let vpc_id = ctx.invoke(
        Invoke::new("vpcId", "aws:ec2:getVpc")
            .arguments(json!({ "default": true }))
            .returning("id"),
    );

    let subnet_ids = ctx.invoke(
        Invoke::new("subnetIds", "aws:ec2:getSubnets")
            .arguments(json!({
                "filters": [{ "name": "vpc-id", "values": [vpc_id.value()] }],
            }))
            .returning("ids"),
    );

    let subnets: Vec<String> = (0..SUBNET_COUNT)
        .map(|i| format!("${{{}[{}]}}", subnet_ids.name(), i))
        .collect();
    let subnet_group = ctx.resource(
        Resource::new("db-subnet", "aws:rds:SubnetGroup")
            .properties(json!({ "subnetIds": subnets })),
    );

    let open_rule = json!({
        "protocol": "-1",
        "fromPort": 0,
        "toPort": 0,
        "cidrBlocks": ["0.0.0.0/0"],
    });
    let security_group = ctx.resource(
        Resource::new("public-security-group", "aws:ec2:SecurityGroup").properties(json!({
            "ingress": [open_rule.clone()],
            "egress": [open_rule],
        })),
    );

    let cluster = ctx.resource(Resource::new("db", "aws:rds:Cluster").properties(json!({
        "engine": ENGINE,
        "engineVersion": ENGINE_VERSION,
        "databaseName": DB_NAME,
        "masterUsername": DB_USER,
        "masterPassword": DB_PASSWORD,
        "skipFinalSnapshot": true,
        "dbSubnetGroupName": subnet_group.attr("name"),
        "vpcSecurityGroupIds": [security_group.id()],
    })));

    ctx.resource(
        Resource::new("db-instance", "aws:rds:ClusterInstance").properties(json!({
            "clusterIdentifier": cluster.attr("clusterIdentifier"),
            "instanceClass": INSTANCE_CLASS,
            "engine": ENGINE,
            "engineVersion": ENGINE_VERSION,
            "publiclyAccessible": true,
            "dbSubnetGroupName": subnet_group.attr("name"),
        })),
    );

    ctx.export("host", cluster.attr("endpoint"));
    ctx.export("db_name", DB_NAME);
    ctx.export("db_user", DB_USER);
    ctx.export("db_pass", DB_PASSWORD);
}
