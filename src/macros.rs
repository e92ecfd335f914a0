#[rustfmt::skip]
macro_rules! all_the_tuples {
    ($name:ident) => {
        $name!([], A);
        $name!([A], B);
        $name!([A, B], C);
        $name!([A, B, C], D);
        $name!([A, B, C, D], E);
        $name!([A, B, C, D, E], F);
    };
}
