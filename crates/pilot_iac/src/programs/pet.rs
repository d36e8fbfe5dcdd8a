//! A single random pet name, used to demonstrate preview plans.

use crate::program::{ProgramContext, Resource};

pub const PROJECT_NAME: &str = "inline_preview_up";

pub fn declare(ctx: &mut ProgramContext) {
    let pet = ctx.resource(Resource::new("name", "random:RandomPet"));
    ctx.export("name", pet.id());
}
