pub mod model_loaders;

pub use model_loaders::{
    board_for_user, column_for_user, load_board_middleware, load_column_middleware,
    load_task_middleware, task_for_user,
};
