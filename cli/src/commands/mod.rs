mod cook;
mod helpers;
mod recipe;
mod transfer;

pub(crate) use cook::cmd_cook_import;
pub(crate) use recipe::{
    ListFilter, RecipeInput, cmd_add, cmd_categories, cmd_delete, cmd_edit, cmd_favorite,
    cmd_list, cmd_show,
};
pub(crate) use transfer::{cmd_export, cmd_import, cmd_share};
